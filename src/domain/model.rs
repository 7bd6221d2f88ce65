use serde::Serialize;
use std::collections::BTreeMap;

/// Geographic extent in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.west, self.south, self.east, self.north]
    }
}

/// A node of the WMS layer tree. Whether a node is a group or a leaf is
/// decided once when the capabilities document is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerNode {
    Group {
        name: Option<String>,
        title: Option<String>,
        children: Vec<LayerNode>,
    },
    Leaf {
        name: Option<String>,
        title: Option<String>,
        bbox: Option<BoundingBox>,
    },
}

impl LayerNode {
    pub fn leaf(name: &str, title: &str) -> Self {
        LayerNode::Leaf {
            name: Some(name.to_string()),
            title: Some(title.to_string()),
            bbox: None,
        }
    }

    pub fn group(title: &str, children: Vec<LayerNode>) -> Self {
        LayerNode::Group {
            name: None,
            title: Some(title.to_string()),
            children,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            LayerNode::Group { name, .. } | LayerNode::Leaf { name, .. } => name.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            LayerNode::Group { title, .. } | LayerNode::Leaf { title, .. } => title.as_deref(),
        }
    }

    pub fn children(&self) -> &[LayerNode] {
        match self {
            LayerNode::Group { children, .. } => children,
            LayerNode::Leaf { .. } => &[],
        }
    }

    /// Declared name, or the title when the node has no name.
    pub fn identifier(&self) -> Option<&str> {
        self.name().or_else(|| self.title())
    }

    /// Number of named layers in this subtree, this node included.
    pub fn named_layer_count(&self) -> usize {
        let own = usize::from(self.name().is_some());
        own + self
            .children()
            .iter()
            .map(LayerNode::named_layer_count)
            .sum::<usize>()
    }
}

/// Parsed result of a GetCapabilities request.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDocument {
    pub version: String,
    pub service_title: Option<String>,
    pub root: LayerNode,
}

impl CapabilityDocument {
    /// Number of requestable (named) layers anywhere in the tree.
    pub fn layer_count(&self) -> usize {
        self.root.named_layer_count()
    }

    /// Top-level display layers: the root's children, or the root itself when
    /// the server publishes a single leaf.
    pub fn top_level_layers(&self) -> &[LayerNode] {
        match &self.root {
            LayerNode::Group { children, .. } => children,
            leaf @ LayerNode::Leaf { .. } => std::slice::from_ref(leaf),
        }
    }
}

// Output document. Fields are declared in alphabetical order so the YAML
// keys come out sorted.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    pub bbox: Vec<f64>,
    pub srs: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRequest {
    pub layers: String,
    pub transparent: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryTrigger {
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    pub req: SourceRequest,
    pub retry: RetryTrigger,
    #[serde(rename = "type")]
    pub source_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayLayer {
    Group {
        layers: Vec<DisplayLayer>,
        name: String,
        title: String,
    },
    Leaf {
        name: String,
        sources: Vec<String>,
        title: String,
    },
}

impl DisplayLayer {
    pub fn name(&self) -> &str {
        match self {
            DisplayLayer::Group { name, .. } | DisplayLayer::Leaf { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemoService {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMetadata {
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WmsService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md: Option<ServiceMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Services {
    pub demo: DemoService,
    pub wms: WmsService,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputConfig {
    pub layers: Vec<DisplayLayer>,
    pub services: Services,
    pub sources: BTreeMap<String, SourceDefinition>,
}
