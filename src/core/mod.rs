pub mod client;
pub mod etl;
pub mod pagination;
pub mod pipeline;
pub mod reader;
pub mod resource;
pub mod source;

pub use crate::domain::model::{Record, StreamBatch, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
