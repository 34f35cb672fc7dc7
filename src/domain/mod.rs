// Domain layer: record model, export formats and ports. No I/O here.

pub mod format;
pub mod model;
pub mod ports;
