use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Outcome of one export run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub streams: usize,
    pub records: usize,
    pub pages: usize,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting Fastbill export...");
        self.monitor.log_stats("Start");

        tracing::info!("Extracting data...");
        let batches = self.pipeline.extract().await?;
        let streams = batches.len();
        let pages: usize = batches.iter().map(|b| b.pages).sum();
        tracing::info!(
            "Extracted {} records from {} streams",
            batches.iter().map(|b| b.records.len()).sum::<usize>(),
            streams
        );
        self.monitor.log_stats("Extract");

        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(batches).await?;
        let records = transformed.record_count;
        tracing::info!("Rendered {} output files", transformed.files.len());
        self.monitor.log_stats("Transform");

        tracing::info!("Loading data...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunSummary {
            output_path,
            streams,
            records,
            pages,
        })
    }
}
