use crate::domain::model::CapabilityDocument;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Something that can answer a GetCapabilities request. One call is one
/// attempt; retrying is the caller's business.
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    async fn fetch(&self, url: &str, version: &str) -> Result<CapabilityDocument>;
}
