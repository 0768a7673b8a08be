use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::registry::InFlightRegistry;
use crate::request::RequestDescriptor;
use crate::transport::{Transport, TransportResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for the request guard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Whether duplicate in-flight requests are rejected
    pub enabled: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Rejects a request while a structurally identical one is still in flight.
///
/// The first caller for a fingerprint reaches the transport; anyone else
/// asking for the same fingerprint before it settles gets
/// [`Error::Duplicate`] straight away. Losers never share the winner's
/// result, and nothing is retried.
pub struct RequestGuard<T> {
    transport: T,
    registry: InFlightRegistry,
    config: GuardConfig,
    dispatched: AtomicU64,
    duplicates_rejected: AtomicU64,
}

impl<T: Transport> RequestGuard<T> {
    pub fn new(transport: T, config: GuardConfig) -> Self {
        Self {
            transport,
            registry: InFlightRegistry::new(),
            config,
            dispatched: AtomicU64::new(0),
            duplicates_rejected: AtomicU64::new(0),
        }
    }

    /// Send `request` unless an identical one is already in flight.
    ///
    /// The registry check and insert happen before the first await, so two
    /// dispatches polled in the same tick cannot both win. The slot is
    /// released when the transport settles, or when this future is dropped.
    pub async fn dispatch(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        if !self.config.enabled {
            self.dispatched.fetch_add(1, Ordering::Relaxed);
            return Ok(self.transport.send(request).await?);
        }

        let fingerprint = Fingerprint::of(&request);
        let Some(permit) = self.registry.try_acquire(&fingerprint) else {
            self.duplicates_rejected.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "Suppressing duplicate {} {} ({})",
                request.method(),
                request.url(),
                fingerprint
            );
            return Err(Error::Duplicate { fingerprint });
        };

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Dispatching {} {} ({})",
            request.method(),
            request.url(),
            permit.fingerprint()
        );

        let result = self.transport.send(request).await;
        drop(permit);

        Ok(result?)
    }

    pub fn fingerprint(&self, request: &RequestDescriptor) -> Fingerprint {
        Fingerprint::of(request)
    }

    pub fn is_in_flight(&self, fingerprint: &Fingerprint) -> bool {
        self.registry.contains(fingerprint)
    }

    /// Manually forget a fingerprint. Idempotent.
    pub fn release(&self, fingerprint: &Fingerprint) -> bool {
        self.registry.release(fingerprint)
    }

    /// Forget every in-flight fingerprint.
    pub fn clear(&self) {
        self.registry.clear();
        log::info!("Request guard cleared");
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn stats(&self) -> GuardStats {
        GuardStats {
            in_flight: self.registry.len(),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            duplicates_rejected: self.duplicates_rejected.load(Ordering::Relaxed),
            oldest_in_flight: self.registry.oldest_dispatch(),
        }
    }
}

/// Statistics for the request guard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardStats {
    pub in_flight: usize,
    pub dispatched: u64,
    pub duplicates_rejected: u64,
    pub oldest_in_flight: Option<DateTime<Utc>>,
}

/// Thread-safe wrapper for the guard
pub type SharedRequestGuard<T> = Arc<RequestGuard<T>>;
