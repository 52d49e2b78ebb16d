//! Ports layer: capability traits this subsystem depends on.

pub mod outbound;
