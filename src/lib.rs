pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{
    clean::TextCleaner, convert::DocumentConverter, etl::EtlEngine,
    pipeline::ConversionPipeline,
};
pub use utils::error::{EtlError, Result};
