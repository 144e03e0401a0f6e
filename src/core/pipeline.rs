use crate::core::source::FastbillSource;
use crate::core::{ConfigProvider, Pipeline, Storage, StreamBatch, TransformResult};
use crate::domain::model::{OutputFile, RecordMessage};
use crate::utils::error::Result;
use std::collections::BTreeSet;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const FORMAT_JSONL: &str = "jsonl";
pub const FORMAT_CSV: &str = "csv";
pub const SUPPORTED_FORMATS: [&str; 2] = [FORMAT_JSONL, FORMAT_CSV];

/// Reads the selected Fastbill streams and writes them out as files.
pub struct ExportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ExportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<StreamBatch>> {
        let resources = FastbillSource::streams(self.config.streams())?;
        let source = FastbillSource::new(&self.config)?;

        let mut batches = Vec::with_capacity(resources.len());
        for resource in resources {
            batches.push(source.read_stream(resource).await?);
        }
        Ok(batches)
    }

    async fn transform(&self, data: Vec<StreamBatch>) -> Result<TransformResult> {
        let mut files = Vec::new();
        let mut record_count = 0;

        for batch in &data {
            record_count += batch.records.len();

            if self.wants(FORMAT_JSONL) {
                files.push(OutputFile {
                    name: format!("{}.jsonl", batch.stream),
                    content: to_jsonl(batch)?,
                });
            }
            if self.wants(FORMAT_CSV) {
                files.push(OutputFile {
                    name: format!("{}.csv", batch.stream),
                    content: to_csv(batch)?,
                });
            }
        }

        let catalog = FastbillSource::discover();
        files.push(OutputFile {
            name: "catalog.json".to_string(),
            content: serde_json::to_vec_pretty(&catalog)?,
        });

        tracing::debug!("Rendered {} files for {} records", files.len(), record_count);
        Ok(TransformResult {
            files,
            record_count,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        if !self.config.compress() {
            for file in &result.files {
                tracing::debug!("Writing {} ({} bytes)", file.name, file.content.len());
                self.storage.write_file(&file.name, &file.content).await?;
            }
            return Ok(self.config.output_path().to_string());
        }

        let archive_name = self.config.archive_name();
        tracing::debug!("Creating ZIP file with {} files", result.files.len());

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for file in &result.files {
                zip.start_file(file.name.as_str(), SimpleFileOptions::default())?;
                zip.write_all(&file.content)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        Ok(format!("{}/{}", self.config.output_path(), archive_name))
    }
}

fn to_jsonl(batch: &StreamBatch) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in &batch.records {
        let message = RecordMessage {
            stream: batch.stream.clone(),
            data: record.data.clone(),
            emitted_at: batch.emitted_at,
        };
        serde_json::to_writer(&mut out, &message)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Header is the sorted union of field names, primary key first.
fn to_csv(batch: &StreamBatch) -> Result<Vec<u8>> {
    let mut columns: Vec<&str> = batch
        .records
        .iter()
        .flat_map(|r| r.data.keys().map(String::as_str))
        .filter(|k| *k != batch.primary_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    columns.insert(0, batch.primary_key.as_str());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for record in &batch.records {
        let row = columns.iter().map(|column| match record.data.get(*column) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::utils::error::EtlError::IoError(e.into_error()))
}
