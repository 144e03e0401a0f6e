use clap::Parser;
use fastbill_etl::core::ConfigProvider;
use fastbill_etl::domain::model::{ConnectionStatus, RecordMessage};
use fastbill_etl::utils::error::EtlError;
use fastbill_etl::utils::{logger, validation::Validate};
use fastbill_etl::{
    Cli, Command, EtlEngine, ExportPipeline, FastbillSource, LocalStorage, TomlConfig,
};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.config.log_json {
        logger::init_json_logger(cli.config.verbose);
    } else {
        logger::init_cli_logger(cli.config.verbose);
    }

    tracing::info!("Starting fastbill-etl");
    tracing::debug!("CLI config: {:?}", cli.config);

    let exit_code = match &cli.config.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = match TomlConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    let context = format!("Failed to load config file '{}'", path);
                    std::process::exit(report_failure(&context, &e));
                }
            };
            let monitor = cli.config.monitor || config.monitoring_enabled();
            run(&cli.command, config, monitor).await?
        }
        None => run(&cli.command, cli.config.clone(), cli.config.monitor).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

async fn run<C>(command: &Command, config: C, monitor: bool) -> anyhow::Result<i32>
where
    C: ConfigProvider + Validate + 'static,
{
    match command {
        Command::Discover => {
            let catalog = FastbillSource::discover();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(0)
        }
        Command::Check => {
            let status = match config.validate() {
                Ok(()) => FastbillSource::check_connection(&config).await,
                Err(e) => ConnectionStatus::failed(e.user_friendly_message()),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(if status.succeeded { 0 } else { 1 })
        }
        Command::Read { stdout } => {
            if let Err(e) = config.validate() {
                return Ok(report_failure("Configuration validation failed", &e));
            }

            let outcome = if *stdout {
                read_to_stdout(&config).await
            } else {
                export(config, monitor).await
            };

            Ok(match outcome {
                Ok(()) => 0,
                Err(e) => report_failure("Export failed", &e),
            })
        }
    }
}

async fn export<C: ConfigProvider + 'static>(config: C, monitor: bool) -> Result<(), EtlError> {
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path());
    let pipeline = ExportPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    let summary = engine.run().await?;
    tracing::info!(
        "✅ Exported {} records from {} streams ({} pages)",
        summary.records,
        summary.streams,
        summary.pages
    );
    println!("✅ Export completed successfully!");
    println!("📁 Output saved to: {}", summary.output_path);
    Ok(())
}

async fn read_to_stdout<C: ConfigProvider>(config: &C) -> Result<(), EtlError> {
    let source = FastbillSource::new(config)?;

    for resource in FastbillSource::streams(config.streams())? {
        let batch = source.read_stream(resource).await?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for record in batch.records {
            let message = RecordMessage {
                stream: batch.stream.clone(),
                data: record.data,
                emitted_at: batch.emitted_at,
            };
            serde_json::to_writer(&mut out, &message)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
    }
    Ok(())
}

fn report_failure(context: &str, e: &EtlError) -> i32 {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    e.exit_code()
}
