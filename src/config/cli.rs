use crate::config::{GeneratorConfig, DEFAULT_OUTPUT, DEFAULT_TIMEOUT_SECS, DEFAULT_VERSION};
use crate::core::Storage;
use crate::utils::error::Result;
use crate::utils::retry::RetryPolicy;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "mapproxy-gen")]
#[command(about = "Generate a MapProxy configuration from a WMS GetCapabilities document")]
#[command(disable_version_flag = true)]
pub struct CliArgs {
    /// WMS service URL
    pub url: String,

    /// Where to write the configuration
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// WMS protocol version to request
    #[arg(long, default_value = DEFAULT_VERSION)]
    pub version: String,

    /// HTTP timeout per request, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Total time to keep retrying a failing fetch, in seconds (0 = forever)
    #[arg(long, default_value_t = 60)]
    pub max_retry_time: u64,

    /// Print the configuration to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    pub fn generator_config(&self) -> GeneratorConfig {
        let retry = match self.max_retry_time {
            0 => RetryPolicy::unbounded(),
            secs => RetryPolicy::default().with_max_elapsed(Some(Duration::from_secs(secs))),
        };

        GeneratorConfig {
            url: self.url.clone(),
            output: self.output.clone(),
            version: self.version.clone(),
            timeout: Duration::from_secs(self.timeout),
            retry,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(Path::new(path));

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
