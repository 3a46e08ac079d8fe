//! Calculator Gateway Module
//!
//! The relay service. It exposes `calc.v1.CalculateService`, forwards every
//! request to the calculation service with a bounded deadline, and reports
//! back either the upstream result, the upstream's own error, or a
//! relay-generated `Unavailable` / `DeadlineExceeded`.
//!
//! ## Architecture
//!
//! - `domain/service.rs` - Relay logic: deadline, retry, classification
//! - `domain/outcome.rs` - `RelayOutcome` and its mapping to gRPC statuses
//! - `infra/pool.rs` - Outbound connection pool with RAII release
//! - `api/grpc/server.rs` - gRPC server implementation
//! - `module.rs` - Route construction and serving

#![forbid(unsafe_code)]

// === MODULE DEFINITION ===
mod module;
pub use module::CalculatorGateway;

pub mod config;
pub use config::{DeadlinePolicy, GatewayConfig, PoolConfig, RetryConfig, UpstreamConfig};

// === PUBLIC EXPORTS ===
pub mod domain;
pub use domain::{RelayOutcome, Service};

pub mod infra;

// === INTERNAL MODULES ===
#[doc(hidden)]
pub mod api;
