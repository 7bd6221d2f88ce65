use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Connection to {url} failed: {message}")]
    ConnectionError { url: String, message: String },

    #[error("Request to {url} timed out")]
    TimeoutError { url: String },

    #[error("WMS endpoint {url} answered with HTTP {status}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Malformed capabilities document: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Invalid capabilities document: {message}")]
    InvalidCapabilitiesError { message: String },

    #[error("WMS service exception: {message}")]
    ServiceException { message: String },

    #[error("Capabilities document lists only {layers} layer, assuming the server returned a placeholder")]
    PlaceholderCapabilitiesError { layers: usize },

    #[error("Gave up after {attempts} attempts in {elapsed:?}: {last}")]
    RetriesExhaustedError {
        attempts: u32,
        elapsed: Duration,
        last: Box<GeneratorError>,
    },

    #[error("Layer tree transcription failed: {message}")]
    TranscriptionError { message: String },

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Capabilities,
    Transcription,
    Output,
    Configuration,
}

impl GeneratorError {
    /// Whether another fetch attempt may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeneratorError::ConnectionError { .. }
                | GeneratorError::TimeoutError { .. }
                | GeneratorError::PlaceholderCapabilitiesError { .. }
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            GeneratorError::HttpError(_)
            | GeneratorError::ConnectionError { .. }
            | GeneratorError::TimeoutError { .. }
            | GeneratorError::HttpStatusError { .. } => ErrorCategory::Network,
            GeneratorError::XmlError(_)
            | GeneratorError::InvalidCapabilitiesError { .. }
            | GeneratorError::ServiceException { .. }
            | GeneratorError::PlaceholderCapabilitiesError { .. } => ErrorCategory::Capabilities,
            GeneratorError::RetriesExhaustedError { last, .. } => last.category(),
            GeneratorError::TranscriptionError { .. } => ErrorCategory::Transcription,
            GeneratorError::YamlError(_) | GeneratorError::IoError(_) => ErrorCategory::Output,
            GeneratorError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GeneratorError::RetriesExhaustedError { attempts, last, .. } => format!(
                "Could not fetch capabilities after {} attempts: {}",
                attempts, last
            ),
            GeneratorError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the WMS URL is reachable and try again, or raise --max-retry-time"
            }
            ErrorCategory::Capabilities => {
                "Open the GetCapabilities URL in a browser and check that the server lists its layers"
            }
            ErrorCategory::Transcription => {
                "Every layer needs a Name or Title that contains at least one letter or digit"
            }
            ErrorCategory::Output => "Check that the output path is writable",
            ErrorCategory::Configuration => "Run with --help to see the accepted options",
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
