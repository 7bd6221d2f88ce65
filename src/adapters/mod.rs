// Adapters layer: concrete implementations for external systems (http, xml, yaml).

pub mod capabilities;
pub mod wms;
pub mod yaml;
