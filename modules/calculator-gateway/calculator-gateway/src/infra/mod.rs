//! Outbound side of the relay: connections to the calculation service.

pub mod pool;
pub mod upstream;

pub use pool::{ConnectionPool, Connector, PoolError, PoolStats, PooledConnection};
pub use upstream::{GrpcConnector, Upstream};
