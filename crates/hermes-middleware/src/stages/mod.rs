//! Built-in middleware stages.

pub mod validation;

pub use validation::ValidationStage;
