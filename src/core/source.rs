use crate::core::client::FastbillClient;
use crate::core::reader::StreamReader;
use crate::core::resource::Resource;
use crate::domain::model::{Catalog, ConnectionStatus, StreamBatch};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;

/// Entry point of the connector: connection check, catalog and stream reads.
pub struct FastbillSource {
    client: FastbillClient,
    page_size: usize,
    max_records: Option<usize>,
}

impl FastbillSource {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self {
            client: FastbillClient::from_config(config)?,
            page_size: config.page_size(),
            max_records: config.max_records(),
        })
    }

    /// Reads the first page of customers. Failures never escape as errors.
    pub async fn check_connection<C: ConfigProvider>(config: &C) -> ConnectionStatus {
        let outcome = match Self::new(config) {
            Ok(source) => source
                .reader(Resource::Customers)
                .read_page(None)
                .await
                .map(|(records, _)| records.len()),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(count) => {
                tracing::info!("✅ Connected to Fastbill ({} customers on first page)", count);
                ConnectionStatus::succeeded()
            }
            Err(e) => {
                tracing::warn!("❌ Connection check failed: {}", e);
                ConnectionStatus::failed(format!(
                    "Unable to connect to Fastbill API with the provided credentials - {:?}",
                    e
                ))
            }
        }
    }

    pub fn discover() -> Catalog {
        Catalog {
            streams: Resource::ALL.iter().map(|r| r.descriptor()).collect(),
        }
    }

    pub fn streams(selection: &[String]) -> Result<Vec<Resource>> {
        Resource::select(selection)
    }

    pub fn reader(&self, resource: Resource) -> StreamReader<'_> {
        StreamReader::new(&self.client, resource, self.page_size).with_max_records(self.max_records)
    }

    pub async fn read_stream(&self, resource: Resource) -> Result<StreamBatch> {
        tracing::info!("📡 Reading stream {} from {}", resource, self.client.base_url());
        self.reader(resource).read_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_lists_all_streams() {
        let catalog = FastbillSource::discover();
        let names: Vec<_> = catalog.streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["customers", "invoices", "recurring_invoices", "products", "revenues"]
        );
        assert!(catalog
            .streams
            .iter()
            .all(|s| s.supported_sync_modes == vec!["full_refresh".to_string()]));
        assert_eq!(catalog.streams[3].primary_key, "ARTICLE_ID");
    }
}
