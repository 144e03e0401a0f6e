use crate::core::pagination::RequestBody;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://my.fastbill.com/api/1.0/api.php";

/// Thin wrapper over `reqwest` posting JSON service calls to the Fastbill API.
#[derive(Clone)]
pub struct FastbillClient {
    client: Client,
    base_url: String,
    username: String,
    api_key: String,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl FastbillClient {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .user_agent(concat!("fastbill-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim().to_string(),
            username: config.username().to_string(),
            api_key: config.api_key().to_string(),
            retry_attempts: config.retry_attempts(),
            retry_delay: config.retry_delay(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts one service call, retrying transient failures.
    pub async fn post(&self, body: &RequestBody) -> Result<Value> {
        let mut attempt = 0;
        loop {
            match self.post_once(body).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ {} offset {} failed ({}), retry {}/{} in {:?}",
                        body.service,
                        body.offset,
                        e,
                        attempt,
                        self.retry_attempts,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(&self, body: &RequestBody) -> Result<Value> {
        tracing::debug!(
            "Making API request to: {} ({} offset {})",
            self.base_url,
            body.service,
            body.offset
        );

        let response = self
            .client
            .post(&self.base_url)
            .basic_auth(&self.username, Some(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                body: truncate(&body, 512),
            });
        }

        let json: Value = response.json().await?;
        check_api_errors(&body.service, &json)?;
        Ok(json)
    }
}

/// Fastbill reports service failures inside a 200 response.
fn check_api_errors(service: &str, json: &Value) -> Result<()> {
    let errors = json
        .get("RESPONSE")
        .and_then(|r| r.get("ERRORS"))
        .filter(|e| match e {
            Value::Array(items) => !items.is_empty(),
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        });

    match errors {
        Some(errors) => Err(EtlError::ApiResponseError {
            service: service.to_string(),
            errors: errors.to_string(),
        }),
        None => Ok(()),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
