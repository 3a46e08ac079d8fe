//! TCP serving for tonic routes.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::service::Routes;
use tonic::transport::Server;

/// Failure to bind or run a gRPC server.
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("invalid listen_addr '{addr}': {source}")]
    InvalidAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC server failed: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Bind a TCP listener for a gRPC server.
///
/// Port `0` binds an ephemeral port; read it back with
/// [`TcpListener::local_addr`].
///
/// # Errors
/// Returns [`ServeError`] if the address does not parse or cannot be bound.
pub async fn bind_tcp(listen_addr: &str) -> Result<TcpListener, ServeError> {
    let addr: SocketAddr = listen_addr
        .parse()
        .map_err(|source| ServeError::InvalidAddr {
            addr: listen_addr.to_owned(),
            source,
        })?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })
}

/// Serve `routes` on an already bound listener until `cancel` fires.
///
/// In-flight calls are allowed to finish after cancellation.
///
/// # Errors
/// Returns [`ServeError::Transport`] if the server fails.
pub async fn serve_tcp(
    listener: TcpListener,
    routes: Routes,
    cancel: CancellationToken,
) -> Result<(), ServeError> {
    let bound_addr = listener.local_addr().ok();
    if let Some(addr) = bound_addr {
        tracing::info!(%addr, transport = "tcp", "gRPC server listening");
    }

    let incoming = TcpListenerStream::new(listener);
    Server::builder()
        .add_routes(routes)
        .serve_with_incoming_shutdown(incoming, async move {
            cancel.cancelled().await;
        })
        .await?;

    tracing::info!("gRPC server stopped");
    Ok(())
}
