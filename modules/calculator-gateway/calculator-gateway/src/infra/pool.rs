//! Outbound connection pool.
//!
//! Connections are handed out behind a [`PooledConnection`] guard. Dropping
//! the guard releases the slot on every path (normal return, `?`, timeout,
//! task cancellation, panic). The connection itself goes back to the idle
//! set only when the holder called [`PooledConnection::mark_reusable`] after
//! a complete round trip; anything else closes it.
//!
//! Idle connections are checked for age only. Liveness comes from the
//! transport: a gRPC `Channel` sends HTTP/2 keepalive pings while idle and
//! redials a dropped peer on its next call. A call that still fails on a
//! reused connection is classified as unavailable and the connection is
//! closed, never returned to the idle set.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use calc_transport_grpc::ConnectError;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;

/// Dials new connections for the pool.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Conn: Send + 'static;

    /// Open one new connection.
    ///
    /// # Errors
    /// Returns [`ConnectError`] if the peer cannot be reached.
    async fn connect(&self) -> Result<Self::Conn, ConnectError>;
}

#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    #[error("connection pool exhausted, no free slot within {}ms", .0.as_millis())]
    Exhausted(Duration),

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Point-in-time pool counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently held by callers.
    pub in_use: usize,
    /// Connections parked for reuse.
    pub idle: usize,
    /// Connections dialed since the pool was created.
    pub opened: usize,
    /// Connections closed since the pool was created.
    pub closed: usize,
}

struct IdleConn<T> {
    conn: T,
    since: Instant,
}

struct Shared<T> {
    idle: Mutex<VecDeque<IdleConn<T>>>,
    in_use: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
    max_idle: usize,
    idle_timeout: Duration,
}

impl<T> Shared<T> {
    /// Newest idle connection that has not outlived `idle_timeout`.
    fn take_idle(&self) -> Option<T> {
        let (fresh, expired) = {
            let mut idle = self.idle.lock();
            let mut expired = Vec::new();
            // Oldest entries sit at the front.
            while idle
                .front()
                .is_some_and(|entry| entry.since.elapsed() >= self.idle_timeout)
            {
                if let Some(entry) = idle.pop_front() {
                    expired.push(entry);
                }
            }
            (idle.pop_back(), expired)
        };

        if !expired.is_empty() {
            self.closed.fetch_add(expired.len(), Ordering::Relaxed);
            tracing::debug!(count = expired.len(), "closing expired idle connections");
        }
        fresh.map(|entry| entry.conn)
    }

    fn release(&self, conn: T, reusable: bool) {
        self.in_use.fetch_sub(1, Ordering::Relaxed);

        if reusable {
            let mut idle = self.idle.lock();
            if idle.len() < self.max_idle {
                idle.push_back(IdleConn {
                    conn,
                    since: Instant::now(),
                });
                return;
            }
        }

        self.closed.fetch_add(1, Ordering::Relaxed);
        drop(conn);
    }
}

/// Bounded pool of connections produced by a [`Connector`].
pub struct ConnectionPool<C: Connector> {
    connector: Arc<C>,
    shared: Arc<Shared<C::Conn>>,
    slots: Arc<Semaphore>,
    acquire_timeout: Duration,
}

impl<C: Connector> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            shared: Arc::clone(&self.shared),
            slots: Arc::clone(&self.slots),
            acquire_timeout: self.acquire_timeout,
        }
    }
}

impl<C: Connector> ConnectionPool<C> {
    #[must_use]
    pub fn new(connector: C, cfg: &PoolConfig) -> Self {
        Self {
            connector: Arc::new(connector),
            shared: Arc::new(Shared {
                idle: Mutex::new(VecDeque::with_capacity(cfg.max_idle)),
                in_use: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                max_idle: cfg.max_idle,
                idle_timeout: cfg.idle_timeout,
            }),
            slots: Arc::new(Semaphore::new(
                cfg.max_connections.min(Semaphore::MAX_PERMITS),
            )),
            acquire_timeout: cfg.acquire_timeout,
        }
    }

    /// Take a connection, reusing an idle one when possible.
    ///
    /// # Errors
    /// Returns [`PoolError::Exhausted`] if no slot frees up within
    /// `acquire_timeout`, or [`PoolError::Connect`] if dialing fails.
    pub async fn acquire(&self) -> Result<PooledConnection<C::Conn>, PoolError> {
        let slot = match tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.slots).acquire_owned(),
        )
        .await
        {
            Ok(Ok(slot)) => slot,
            // The semaphore is never closed, so only the timeout lands here.
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(
                    acquire_timeout_ms = %self.acquire_timeout.as_millis(),
                    "connection pool exhausted"
                );
                return Err(PoolError::Exhausted(self.acquire_timeout));
            }
        };

        let conn = if let Some(conn) = self.shared.take_idle() {
            tracing::trace!("reusing idle connection");
            conn
        } else {
            let conn = self.connector.connect().await?;
            self.shared.opened.fetch_add(1, Ordering::Relaxed);
            conn
        };

        self.shared.in_use.fetch_add(1, Ordering::Relaxed);
        Ok(PooledConnection {
            conn: Some(conn),
            reusable: false,
            shared: Arc::clone(&self.shared),
            _slot: slot,
        })
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            in_use: self.shared.in_use.load(Ordering::Relaxed),
            idle: self.shared.idle.lock().len(),
            opened: self.shared.opened.load(Ordering::Relaxed),
            closed: self.shared.closed.load(Ordering::Relaxed),
        }
    }
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Closed on drop unless [`mark_reusable`](Self::mark_reusable) was called.
pub struct PooledConnection<T> {
    conn: Option<T>,
    reusable: bool,
    shared: Arc<Shared<T>>,
    // Released after `Drop::drop` has handed the connection back.
    _slot: OwnedSemaphorePermit,
}

impl<T> PooledConnection<T> {
    /// Allow the connection back into the idle set once this guard drops.
    pub fn mark_reusable(&mut self) {
        self.reusable = true;
    }
}

impl<T> Deref for PooledConnection<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("connection is only taken on drop"))
    }
}

impl<T> DerefMut for PooledConnection<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.conn
            .as_mut()
            .unwrap_or_else(|| unreachable!("connection is only taken on drop"))
    }
}

impl<T> Drop for PooledConnection<T> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.shared.release(conn, self.reusable);
        }
    }
}
