//! Calculator SDK
//!
//! This crate provides everything needed to call or serve the calculator:
//! - Domain types (`CalculationRequest`, `CalculationResponse`)
//! - API trait (`CalculatorClient`) and error type (`CalculatorError`)
//! - gRPC client (`CalculatorGrpcClient`), usable against the calculation
//!   service or the gateway since both expose the same contract
//! - Proto stubs for server implementations
//!
//! ## Usage
//!
//! ```ignore
//! use calculator_sdk::{CalculationRequest, CalculatorClient, CalculatorGrpcClient};
//!
//! let client = CalculatorGrpcClient::connect("http://127.0.0.1:50051").await?;
//! let response = client.calculate(CalculationRequest::new(15, "+", 5)).await?;
//! assert_eq!(response.result, 20);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// === API TRAIT AND TYPES ===
mod api;
mod models;
pub use api::{CalculatorClient, CalculatorError};
pub use models::{CalculationRequest, CalculationResponse};

// === GRPC CLIENT ===
mod client;
pub use client::CalculatorGrpcClient;

// === GRPC PROTO STUBS (for server implementation) ===
/// Generated protobuf types for `CalculateService`
#[allow(clippy::all, clippy::pedantic)]
pub mod proto {
    tonic::include_proto!("calc.v1");
}

pub use proto::calculate_service_client::CalculateServiceClient;
pub use proto::calculate_service_server::{CalculateService, CalculateServiceServer};
pub use proto::{CalculateRequest, CalculateResponse};

/// Fully qualified gRPC service name, shared by both services.
pub const SERVICE_NAME: &str = "calc.v1.CalculateService";
