pub mod generator;
pub mod loader;
pub mod transcriber;

pub use crate::domain::model::{CapabilityDocument, LayerNode, OutputConfig};
pub use crate::domain::ports::{CapabilitySource, Storage};
pub use crate::utils::error::Result;
