// Domain layer: capability tree, output document and the ports the core depends on.

pub mod model;
pub mod ports;
