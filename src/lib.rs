pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, CliConfig, Command};

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    etl::{EtlEngine, RunSummary},
    pipeline::ExportPipeline,
    resource::Resource,
    source::FastbillSource,
};
pub use utils::error::{EtlError, Result};
