//! gRPC API for calculator module

mod server;

pub use server::CalculatorServiceImpl;
