//! Domain layer for calculator module
//!
//! Contains the arithmetic rules and their error taxonomy.

pub mod error;
pub mod service;

pub use error::ComputeError;
pub use service::{Operator, Service};
