pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliArgs, LocalStorage};

pub use adapters::wms::HttpCapabilitySource;
pub use config::GeneratorConfig;
pub use crate::core::{
    generator::MapproxyGenerator, loader::CapabilityLoader, transcriber::Transcriber,
};
pub use utils::error::{GeneratorError, Result};
