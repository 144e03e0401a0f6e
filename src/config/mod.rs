pub mod cli;
pub mod toml_config;

use crate::core::client::DEFAULT_BASE_URL;
use crate::core::pagination::SUPPORTED_PAGE_SIZES;
use crate::core::pipeline::SUPPORTED_FORMATS;
use crate::core::resource::Resource;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_path, validate_positive_number,
    validate_range, validate_secret, validate_url, Validate,
};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::fmt;
#[cfg(feature = "cli")]
use std::time::Duration;

pub const DEFAULT_ARCHIVE_NAME: &str = "fastbill_export.zip";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Checks shared by every configuration source.
pub fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_secret("username", config.username())?;
    validate_secret("api_key", config.api_key())?;
    validate_url("base_url", config.base_url())?;
    validate_range(
        "page_size",
        config.page_size(),
        *SUPPORTED_PAGE_SIZES.start(),
        *SUPPORTED_PAGE_SIZES.end(),
    )?;
    Resource::select(config.streams())?;
    validate_path("output_path", config.output_path())?;
    validate_positive_number("output_formats", config.output_formats().len(), 1)?;
    validate_one_of("output_formats", config.output_formats(), &SUPPORTED_FORMATS)?;
    if config.compress() {
        validate_non_empty_string("archive_name", config.archive_name())?;
    }
    if let Some(max) = config.max_records() {
        validate_positive_number("max_records", max, 1)?;
    }
    Ok(())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "fastbill-etl")]
#[command(about = "Export customers, invoices, products and revenues from Fastbill")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: CliConfig,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Verify the credentials by reading the first page of customers
    Check,
    /// Print the stream catalog as JSON
    Discover,
    /// Read the selected streams and write them to the output path
    Read {
        /// Print records as JSON lines on stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(Clone, Args)]
pub struct CliConfig {
    /// TOML configuration file; replaces the connection and output flags
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Fastbill account e-mail
    #[arg(long, global = true, env = "FASTBILL_USERNAME")]
    pub username: Option<String>,

    /// Fastbill API key
    #[arg(long, global = true, env = "FASTBILL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, global = true, default_value_t = crate::core::pagination::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Streams to read (default: all)
    #[arg(long, global = true, value_delimiter = ',')]
    pub streams: Vec<String>,

    #[arg(long, global = true, default_value = "./output")]
    pub output_path: String,

    #[arg(long, global = true, value_delimiter = ',', default_value = "jsonl")]
    pub output_formats: Vec<String>,

    /// Bundle the output files into one ZIP archive
    #[arg(long, global = true)]
    pub compress: bool,

    #[arg(long, global = true, default_value = DEFAULT_ARCHIVE_NAME)]
    pub archive_name: String,

    /// Stop reading a stream after this many records
    #[arg(long, global = true)]
    pub max_records: Option<usize>,

    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, global = true, default_value_t = DEFAULT_RETRY_ATTEMPTS)]
    pub retry_attempts: u32,

    #[arg(long, global = true, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("username", &self.username)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("streams", &self.streams)
            .field("output_path", &self.output_path)
            .field("output_formats", &self.output_formats)
            .field("compress", &self.compress)
            .field("max_records", &self.max_records)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn streams(&self) -> &[String] {
        &self.streams
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn compress(&self) -> bool {
        self.compress
    }

    fn archive_name(&self) -> &str {
        &self.archive_name
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["fastbill-etl"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["read", "--username", "me@example.com", "--api-key", "k"]);
        assert!(matches!(cli.command, Command::Read { stdout: false }));
        assert_eq!(cli.config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cli.config.page_size(), 100);
        assert_eq!(cli.config.output_formats(), &["jsonl".to_string()]);
        assert!(cli.config.streams().is_empty());
        assert!(cli.config.validate().is_ok());
    }

    #[test]
    fn test_stream_list_and_formats() {
        let cli = parse(&[
            "--username",
            "me@example.com",
            "--api-key",
            "k",
            "read",
            "--streams",
            "invoices,products",
            "--output-formats",
            "jsonl,csv",
            "--stdout",
        ]);
        assert!(matches!(cli.command, Command::Read { stdout: true }));
        assert_eq!(cli.config.streams, vec!["invoices", "products"]);
        assert_eq!(cli.config.output_formats, vec!["jsonl", "csv"]);
    }

    #[test]
    fn test_validation_failures() {
        let missing_key = parse(&["check", "--username", "me@example.com", "--api-key", ""]);
        assert!(missing_key.config.validate().is_err());

        let bad_stream = parse(&[
            "read", "--username", "u", "--api-key", "k", "--streams", "payments",
        ]);
        assert!(bad_stream.config.validate().is_err());

        let bad_page = parse(&["read", "--username", "u", "--api-key", "k", "--page-size", "0"]);
        assert!(bad_page.config.validate().is_err());

        let bad_format = parse(&[
            "read", "--username", "u", "--api-key", "k", "--output-formats", "xml",
        ]);
        assert!(bad_format.config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let cli = parse(&["check", "--username", "u", "--api-key", "super-secret"]);
        let rendered = format!("{:?}", cli.config);
        assert!(!rendered.contains("super-secret"));
    }
}
