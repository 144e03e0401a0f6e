use crate::core::client::FastbillClient;
use crate::core::pagination::{self, PageToken};
use crate::core::resource::Resource;
use crate::domain::model::{Record, StreamBatch};
use crate::utils::error::Result;
use serde_json::Value;

/// Reads every page of one resource, one request at a time.
pub struct StreamReader<'a> {
    client: &'a FastbillClient,
    resource: Resource,
    page_size: usize,
    max_records: Option<usize>,
}

impl<'a> StreamReader<'a> {
    pub fn new(client: &'a FastbillClient, resource: Resource, page_size: usize) -> Self {
        Self {
            client,
            resource,
            page_size,
            max_records: None,
        }
    }

    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Fetches a single page and the token of the page after it.
    pub async fn read_page(&self, token: Option<PageToken>) -> Result<(Vec<Record>, Option<PageToken>)> {
        let body = pagination::request_body(self.resource, token);
        let response = self.client.post(&body).await?;

        let records = parse_response(&response, self.resource.response_key());
        let next = pagination::next_page_token(
            &response,
            self.resource.response_key(),
            self.page_size,
            token,
        )?;

        Ok((records, next))
    }

    pub async fn read_all(&self) -> Result<StreamBatch> {
        let emitted_at = chrono::Utc::now().timestamp_millis();
        let mut records = Vec::new();
        let mut pages = 0;
        let mut token = None;

        loop {
            let (page, next) = self.read_page(token).await?;
            pages += 1;
            tracing::debug!(
                "📄 {}: page {} returned {} records",
                self.resource,
                pages,
                page.len()
            );
            records.extend(page);

            if let Some(max) = self.max_records {
                if records.len() >= max {
                    records.truncate(max);
                    tracing::info!("✂️ {}: stopped at max_records = {}", self.resource, max);
                    break;
                }
            }

            match next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::info!(
            "📥 {}: {} records in {} pages",
            self.resource,
            records.len(),
            pages
        );

        Ok(StreamBatch {
            stream: self.resource.name().to_string(),
            primary_key: self.resource.primary_key().to_string(),
            records,
            pages,
            emitted_at,
        })
    }
}

/// Turns the rows under `RESPONSE.<key>` into records; other keys are ignored.
pub fn parse_response(response: &Value, response_key: &str) -> Vec<Record> {
    pagination::page_rows(response, response_key)
        .iter()
        .filter_map(|row| match row {
            Value::Object(obj) => Some(Record {
                data: obj.clone().into_iter().collect(),
            }),
            other => {
                tracing::warn!("Skipping non-object row under {}: {}", response_key, other);
                None
            }
        })
        .collect()
}
