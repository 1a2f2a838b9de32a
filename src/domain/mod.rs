// Domain layer: request/response models and the ports the verifier depends on.

pub mod model;
pub mod ports;
