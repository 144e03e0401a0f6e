use crate::domain::model::{StreamBatch, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn username(&self) -> &str;
    fn api_key(&self) -> &str;
    fn page_size(&self) -> usize;
    fn streams(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn compress(&self) -> bool;
    fn archive_name(&self) -> &str;
    fn max_records(&self) -> Option<usize>;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<StreamBatch>>;
    async fn transform(&self, data: Vec<StreamBatch>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
