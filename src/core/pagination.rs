//! Offset bookkeeping shared by every stream.
//!
//! Fastbill pages with an `OFFSET` in the request body and echoes the offset
//! it served under `REQUEST.OFFSET`. A page holding as many rows as the page
//! size means another page may follow.

use crate::core::resource::Resource;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use serde_json::Value;
use std::ops::RangeInclusive;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const SUPPORTED_PAGE_SIZES: RangeInclusive<usize> = 1..=1000;

/// Position of the next page to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageToken {
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct RequestBody {
    pub service: String,
    pub filter: serde_json::Map<String, Value>,
    pub offset: u64,
}

pub fn request_body(resource: Resource, token: Option<PageToken>) -> RequestBody {
    RequestBody {
        service: resource.service(),
        filter: serde_json::Map::new(),
        offset: token.map(|t| t.offset).unwrap_or(0),
    }
}

/// Rows under `RESPONSE.<key>`; an absent container counts as an empty page.
pub fn page_rows<'a>(response: &'a Value, response_key: &str) -> &'a [Value] {
    response
        .get("RESPONSE")
        .and_then(|r| r.get(response_key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Offset the API says it served, falling back to the one that was sent.
fn served_offset(response: &Value, requested: u64) -> Result<u64> {
    match response.get("REQUEST").and_then(|r| r.get("OFFSET")) {
        None | Some(Value::Null) => Ok(requested),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| EtlError::PaginationError {
            message: format!("No valid offset value found: {}", n),
        }),
        // some API versions echo numbers as strings
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|_| EtlError::PaginationError {
            message: format!("No valid offset value found: {:?}", s),
        }),
        Some(other) => Err(EtlError::PaginationError {
            message: format!("No valid offset value found: {}", other),
        }),
    }
}

pub fn next_page_token(
    response: &Value,
    response_key: &str,
    page_size: usize,
    requested: Option<PageToken>,
) -> Result<Option<PageToken>> {
    let requested_offset = requested.map(|t| t.offset).unwrap_or(0);
    let offset = served_offset(response, requested_offset)?;

    if page_rows(response, response_key).len() < page_size {
        return Ok(None);
    }

    let next = offset
        .checked_add(page_size as u64)
        .ok_or_else(|| EtlError::PaginationError {
            message: format!("Offset {} cannot advance by {}", offset, page_size),
        })?;
    Ok(Some(PageToken { offset: next }))
}
