use crate::domain::model::{
    CapabilityDocument, Coverage, DisplayLayer, LayerNode, OutputConfig, RetryTrigger,
    ServiceMetadata, Services, SourceDefinition, SourceRequest, WmsService,
};
use crate::utils::error::{GeneratorError, Result};
use crate::utils::slug::slugify;
use std::collections::BTreeMap;

pub const SOURCE_TYPE: &str = "wms_retry";
pub const RETRY_ERROR_MESSAGE: &str = "Overforbruk";
pub const COVERAGE_SRS: &str = "EPSG:4326";

/// Turns a capability layer tree into the MapProxy `layers` tree and the
/// flat `sources` mapping that backs its leaves.
pub struct Transcriber {
    request_url: String,
}

impl Transcriber {
    pub fn new(service_url: &str) -> Self {
        Self {
            request_url: request_url(service_url),
        }
    }

    pub fn transcribe(&self, doc: &CapabilityDocument) -> Result<OutputConfig> {
        let top = doc.top_level_layers();

        let layers = top
            .iter()
            .map(|node| self.display_layer(node))
            .collect::<Result<Vec<_>>>()?;

        let mut sources = BTreeMap::new();
        for node in top {
            self.collect_sources(node, &mut sources)?;
        }

        let md = doc.root.title().map(|title| ServiceMetadata {
            title: title.to_string(),
        });

        tracing::info!(
            "Transcribed {} top-level layers backed by {} sources",
            layers.len(),
            sources.len()
        );
        tracing::debug!(
            "Top-level layers: {}",
            layers.iter().map(DisplayLayer::name).collect::<Vec<_>>().join(", ")
        );

        Ok(OutputConfig {
            layers,
            services: Services {
                demo: Default::default(),
                wms: WmsService { md },
            },
            sources,
        })
    }

    /// Children keep the order the server declared them in.
    pub fn display_layer(&self, node: &LayerNode) -> Result<DisplayLayer> {
        let name = identifier(node)?.to_string();
        let title = node.title().unwrap_or(&name).to_string();

        match node {
            LayerNode::Group { children, .. } => Ok(DisplayLayer::Group {
                layers: children
                    .iter()
                    .map(|child| self.display_layer(child))
                    .collect::<Result<Vec<_>>>()?,
                name,
                title,
            }),
            LayerNode::Leaf { .. } => Ok(DisplayLayer::Leaf {
                sources: vec![source_slug(node)?],
                name,
                title,
            }),
        }
    }

    /// Two leaves whose identifiers slugify alike share one entry; the later
    /// leaf wins and a warning names both.
    pub fn collect_sources(
        &self,
        node: &LayerNode,
        sources: &mut BTreeMap<String, SourceDefinition>,
    ) -> Result<()> {
        match node {
            LayerNode::Group { children, .. } => {
                for child in children {
                    self.collect_sources(child, sources)?;
                }
            }
            LayerNode::Leaf { bbox, .. } => {
                let slug = source_slug(node)?;
                let definition = SourceDefinition {
                    coverage: bbox.map(|b| Coverage {
                        bbox: b.to_vec(),
                        srs: COVERAGE_SRS.to_string(),
                    }),
                    req: SourceRequest {
                        layers: identifier(node)?.to_string(),
                        transparent: true,
                        url: self.request_url.clone(),
                    },
                    retry: RetryTrigger {
                        error_message: RETRY_ERROR_MESSAGE.to_string(),
                    },
                    source_type: SOURCE_TYPE.to_string(),
                };

                if let Some(previous) = sources.insert(slug.clone(), definition) {
                    tracing::warn!(
                        "Layers '{}' and '{}' share the source slug '{}'; keeping the latter",
                        previous.req.layers,
                        identifier(node)?,
                        slug
                    );
                }
            }
        }
        Ok(())
    }
}

/// The service URL with exactly one trailing `?`.
pub fn request_url(service_url: &str) -> String {
    format!("{}?", service_url.trim_end_matches('?'))
}

fn identifier(node: &LayerNode) -> Result<&str> {
    node.identifier()
        .ok_or_else(|| GeneratorError::TranscriptionError {
            message: "layer has neither a name nor a title".to_string(),
        })
}

fn source_slug(node: &LayerNode) -> Result<String> {
    let id = identifier(node)?;
    let slug = slugify(id);
    if slug.is_empty() {
        return Err(GeneratorError::TranscriptionError {
            message: format!("layer '{}' does not produce a usable source name", id),
        });
    }
    Ok(slug)
}
