use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of a Fastbill collection, shaped by the remote schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

/// Envelope written for every exported record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: HashMap<String, serde_json::Value>,
    pub emitted_at: i64,
}

/// Everything read from a single stream.
#[derive(Debug, Clone)]
pub struct StreamBatch {
    pub stream: String,
    pub primary_key: String,
    pub records: Vec<Record>,
    pub pages: usize,
    pub emitted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub primary_key: String,
    pub supported_sync_modes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<StreamDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub succeeded: bool,
    pub message: Option<String>,
}

impl ConnectionStatus {
    pub fn succeeded() -> Self {
        Self {
            succeeded: true,
            message: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            succeeded: false,
            message: Some(message),
        }
    }
}

/// A named file produced by the transform step.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub name: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub files: Vec<OutputFile>,
    pub record_count: usize,
}
