use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug)]
struct InFlight {
    ticket: u64,
    dispatched_at: DateTime<Utc>,
}

/// Set of fingerprints whose requests have been dispatched and not yet settled.
///
/// Entries are only created through [`try_acquire`](Self::try_acquire) and are
/// removed when the returned permit drops, so release happens on every exit
/// path: success, error, panic, or the caller abandoning the future.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: DashMap<Fingerprint, InFlight>,
    next_ticket: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `fingerprint`. Returns `None` when it is already in flight, in
    /// which case the existing entry is left untouched.
    pub fn try_acquire(&self, fingerprint: &Fingerprint) -> Option<InFlightPermit<'_>> {
        let ticket = match self.entries.entry(fingerprint.clone()) {
            Entry::Occupied(_) => return None,
            Entry::Vacant(slot) => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                slot.insert(InFlight {
                    ticket,
                    dispatched_at: Utc::now(),
                });
                ticket
            }
        };

        log::debug!("Acquired in-flight slot for {}", fingerprint);
        Some(InFlightPermit {
            registry: self,
            fingerprint: fingerprint.clone(),
            ticket,
        })
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Forget `fingerprint`. Removing an absent key is a no-op; the return
    /// value tells whether anything was removed.
    pub fn release(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.remove(fingerprint).is_some()
    }

    // Only the permit that created an entry may remove it. After a `clear` a
    // newer request can own the same fingerprint.
    fn release_ticket(&self, fingerprint: &Fingerprint, ticket: u64) -> bool {
        self.entries
            .remove_if(fingerprint, |_, entry| entry.ticket == ticket)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch time of the longest-running request still in flight.
    pub fn oldest_dispatch(&self) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .map(|entry| entry.value().dispatched_at)
            .min()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Proof of ownership of one registry entry. Dropping it releases the entry.
#[derive(Debug)]
pub struct InFlightPermit<'a> {
    registry: &'a InFlightRegistry,
    fingerprint: Fingerprint,
    ticket: u64,
}

impl InFlightPermit<'_> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        if self.registry.release_ticket(&self.fingerprint, self.ticket) {
            log::debug!("Released in-flight slot for {}", self.fingerprint);
        } else {
            log::debug!("In-flight slot for {} was already released", self.fingerprint);
        }
    }
}
