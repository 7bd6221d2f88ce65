use crate::domain::model::CapabilityDocument;
use crate::domain::ports::CapabilitySource;
use crate::utils::error::{GeneratorError, Result};
use crate::utils::retry::{retry, RetryError, RetryPolicy};

/// Fetches a capabilities document, retrying transient failures.
///
/// A document that lists exactly one layer is what the upstream servers
/// return when their real layer list failed to load, so it counts as a
/// transient failure rather than a result.
pub struct CapabilityLoader<C: CapabilitySource> {
    source: C,
    policy: RetryPolicy,
}

impl<C: CapabilitySource> CapabilityLoader<C> {
    pub fn new(source: C, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub async fn load(&self, url: &str, version: &str) -> Result<CapabilityDocument> {
        tracing::info!("Fetching WMS {} capabilities from {}", version, url);

        let this = self;
        let outcome = retry(&self.policy, GeneratorError::is_transient, move || {
            this.fetch_once(url, version)
        })
        .await;

        match outcome {
            Ok(doc) => {
                tracing::info!("Capabilities loaded: {} layers", doc.layer_count());
                Ok(doc)
            }
            Err(RetryError::Permanent(e)) => Err(e),
            Err(RetryError::Exhausted {
                attempts,
                elapsed,
                last,
            }) => Err(GeneratorError::RetriesExhaustedError {
                attempts,
                elapsed,
                last: Box::new(last),
            }),
        }
    }

    async fn fetch_once(&self, url: &str, version: &str) -> Result<CapabilityDocument> {
        let doc = self.source.fetch(url, version).await?;
        let layers = doc.layer_count();
        if layers == 1 {
            return Err(GeneratorError::PlaceholderCapabilitiesError { layers });
        }
        Ok(doc)
    }
}
