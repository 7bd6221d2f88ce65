#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::Result;
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    validate_output_path, validate_service_url, validate_timeout, validate_wms_version, Validate,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "mapproxy.yaml";
pub const DEFAULT_VERSION: &str = "1.1.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const SUPPORTED_VERSIONS: [&str; 2] = ["1.1.1", "1.3.0"];

/// Everything one generation run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// WMS service endpoint, without GetCapabilities parameters.
    pub url: String,
    /// Defaults to `mapproxy.yaml` in the working directory.
    pub output: PathBuf,
    /// WMS protocol version; defaults to `1.1.1`.
    pub version: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl GeneratorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            version: DEFAULT_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl Validate for GeneratorConfig {
    fn validate(&self) -> Result<()> {
        validate_service_url("url", &self.url)?;
        validate_output_path("output", &self.output)?;
        validate_wms_version("version", &self.version, &SUPPORTED_VERSIONS)?;
        validate_timeout("timeout", self.timeout, Duration::from_secs(1))?;
        Ok(())
    }
}
