//! gRPC API for calculator-gateway module

mod server;

pub use server::GatewayServiceImpl;
