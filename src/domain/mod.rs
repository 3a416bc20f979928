// Domain layer: request/result models and the ports the pipeline depends on.

pub mod model;
pub mod ports;
