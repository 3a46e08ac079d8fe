#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
//! gRPC transport plumbing shared by the calculator services.
//!
//! - [`client`] builds outbound channels with connect timeouts and keepalive
//! - [`rpc_retry`] holds the bounded retry policy for transient failures
//! - [`deadline`] reads the caller's `grpc-timeout` from request metadata
//! - [`server`] binds a TCP listener and serves routes until cancelled

pub mod client;
pub mod deadline;
pub mod rpc_retry;
pub mod server;

pub use client::{
    ConnectError, GrpcClientConfig, build_endpoint, connect_with_retry, connect_with_stack,
};
pub use deadline::{GRPC_TIMEOUT_HEADER, caller_timeout, parse_grpc_timeout};
pub use rpc_retry::RpcRetryConfig;
pub use server::{ServeError, bind_tcp, serve_tcp};
