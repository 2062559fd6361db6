//! The downstream connection contract.
//!
//! The raw transport clients (stdio / HTTP / SSE) that actually speak the
//! tool protocol to a downstream server live outside this crate. What the
//! orchestrator needs is only the ability to forward a `callTool` request
//! through whatever connection produced a tool at bind time, so the
//! contract is kept to a single trait plus an opaque handle.

use async_trait::async_trait;
use serde_json::Value;

/// A connection to a downstream tool-providing server.
///
/// Implemented outside this crate by whatever owns the real stdio/HTTP/SSE
/// transport. The orchestrator treats every error as opaque and propagates
/// it untouched (specification §7, `DownstreamCallError`).
#[async_trait]
pub trait DownstreamConnection: Send + Sync {
    /// Forwards `callTool{name, arguments}` and returns its result verbatim.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// An opaque, cheaply-cloneable reference to a [`DownstreamConnection`],
/// borrowed from an external connection manager.
///
/// The contract (specification §5) is that the handle remains valid for
/// the lifetime of the namespace binding that produced it; the
/// orchestrator never owns the connection itself.
#[derive(Clone)]
pub struct ConnectionHandle(std::sync::Arc<dyn DownstreamConnection>);

impl ConnectionHandle {
    /// Wraps a connection implementation in a handle.
    pub fn new(connection: impl DownstreamConnection + 'static) -> Self {
        Self(std::sync::Arc::new(connection))
    }

    /// Forwards to the wrapped connection's `call_tool`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        self.0.call_tool(name, arguments).await
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle").finish_non_exhaustive()
    }
}

/// An in-process stand-in for the external connection manager, keyed by
/// server name. Used by tests and by demo deployments of the `gateway`
/// binary that don't wire up a real transport layer.
#[derive(Default, Clone)]
pub struct StaticDownstreamRegistry {
    connections: std::collections::HashMap<String, ConnectionHandle>,
}

impl StaticDownstreamRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under `server_name`, replacing any existing one.
    pub fn register(&mut self, server_name: impl Into<String>, connection: impl DownstreamConnection + 'static) {
        self.connections.insert(server_name.into(), ConnectionHandle::new(connection));
    }

    /// Looks up the handle registered for `server_name`.
    pub fn get(&self, server_name: &str) -> Option<ConnectionHandle> {
        self.connections.get(server_name).cloned()
    }
}
