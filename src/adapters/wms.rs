use crate::adapters::capabilities::parse_capabilities;
use crate::domain::model::CapabilityDocument;
use crate::domain::ports::CapabilitySource;
use crate::utils::error::{GeneratorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches capabilities over HTTP with one GET per call.
pub struct HttpCapabilitySource {
    client: Client,
}

impl HttpCapabilitySource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

/// Adds the GetCapabilities parameters the URL does not already carry.
pub fn capabilities_url(service_url: &str, version: &str) -> Result<Url> {
    let mut url = Url::parse(service_url).map_err(|e| GeneratorError::InvalidConfigValueError {
        field: "url".to_string(),
        value: service_url.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    let present: Vec<String> = url
        .query_pairs()
        .map(|(key, _)| key.to_ascii_lowercase())
        .collect();

    let missing: Vec<(&str, &str)> = [
        ("service", "WMS"),
        ("request", "GetCapabilities"),
        ("version", version),
    ]
    .into_iter()
    .filter(|(key, _)| !present.iter().any(|p| p.as_str() == *key))
    .collect();

    if !missing.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in missing {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

fn classify(err: reqwest::Error, url: &Url) -> GeneratorError {
    if err.is_timeout() {
        GeneratorError::TimeoutError {
            url: url.to_string(),
        }
    } else if err.is_connect() {
        GeneratorError::ConnectionError {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        GeneratorError::HttpError(err)
    }
}

#[async_trait]
impl CapabilitySource for HttpCapabilitySource {
    async fn fetch(&self, url: &str, version: &str) -> Result<CapabilityDocument> {
        let request_url = capabilities_url(url, version)?;
        tracing::debug!("Requesting capabilities from: {}", request_url);

        let response = self
            .client
            .get(request_url.clone())
            .send()
            .await
            .map_err(|e| classify(e, &request_url))?;

        tracing::debug!("Capabilities response status: {}", response.status());

        if !response.status().is_success() {
            return Err(GeneratorError::HttpStatusError {
                url: request_url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify(e, &request_url))?;
        tracing::debug!("Received {} bytes of capabilities XML", body.len());

        parse_capabilities(&body, version)
    }
}
