//! Domain layer for calculator-gateway module
//!
//! Contains the relay logic and the classification of its outcomes.

pub mod outcome;
pub mod service;

pub use outcome::RelayOutcome;
pub use service::Service;
