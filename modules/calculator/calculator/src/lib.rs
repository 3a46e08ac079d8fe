//! Calculator Module
//!
//! The calculation service: authoritative 32-bit integer arithmetic exposed
//! as `calc.v1.CalculateService`.
//!
//! ## Architecture
//!
//! - `domain/service.rs` - Arithmetic rules and audit logging
//! - `api/grpc/server.rs` - gRPC server implementation
//! - `module.rs` - Route construction and serving
//! - `config.rs` - Typed binary configuration
//!
//! External consumers should use the `calculator-sdk` crate.

#![forbid(unsafe_code)]

// === MODULE DEFINITION ===
mod module;
pub use module::CalculatorModule;

pub mod config;
pub use config::CalculatorConfig;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
