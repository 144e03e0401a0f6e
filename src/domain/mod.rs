// Domain layer: records, output envelopes and the ports the adapters implement.

pub mod model;
pub mod ports;
