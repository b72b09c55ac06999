// Domain layer: wire DTOs, view models and ports. No I/O here.

pub mod model;
pub mod ports;
