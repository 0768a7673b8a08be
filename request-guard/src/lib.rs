// Guarded HTTP client: at most one identical request in flight at a time

pub mod config;
mod error;
pub mod fingerprint;
pub mod guard;
pub mod registry;
mod request;
pub mod transport;


pub use config::ClientConfig;
pub use error::{Error, ErrorKind, Result, SuppressDuplicate, TransportError};
pub use fingerprint::Fingerprint;
pub use guard::{GuardConfig, GuardStats, RequestGuard, SharedRequestGuard};
pub use registry::{InFlightPermit, InFlightRegistry};
pub use request::{Body, Method, RequestDescriptor};
use serde::de::DeserializeOwned;
use std::sync::Arc;
pub use transport::{SurfTransport, Transport, TransportResponse};

pub struct GuardedClient<T = SurfTransport> {
    guard: SharedRequestGuard<T>,
}

impl<T> Clone for GuardedClient<T> {
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
        }
    }
}

impl Default for GuardedClient<SurfTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardedClient<SurfTransport> {
    /// Create a new GuardedClient with default settings (no base URL, guard enabled)
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new GuardedClient talking to the configured backend
    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(SurfTransport::new(&config), config.guard)
    }
}

impl<T: Transport> GuardedClient<T> {
    pub fn with_transport(transport: T, guard_config: GuardConfig) -> Self {
        Self {
            guard: Arc::new(RequestGuard::new(transport, guard_config)),
        }
    }

    /// Send a request, failing fast with [`Error::Duplicate`] when an identical
    /// one is still pending
    pub async fn dispatch(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        self.guard.dispatch(request).await
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<R: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<R> {
        let response = self.dispatch(request).await?;
        Ok(response.json()?)
    }

    pub fn guard(&self) -> &RequestGuard<T> {
        &self.guard
    }

    /// Get guard statistics
    pub fn stats(&self) -> GuardStats {
        self.guard.stats()
    }

    /// Forget all in-flight fingerprints
    pub fn clear_in_flight(&self) {
        self.guard.clear();
    }
}
