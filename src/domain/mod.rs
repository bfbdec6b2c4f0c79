// Domain layer: table model, derived view types and ports. No I/O here.

pub mod model;
pub mod ports;
pub mod series;
