use crate::models::config::ProbeRequest;
use futures::future::join_all;
use getset::CopyGetters;
use log::{info, warn};
use request_guard::{GuardedClient, Transport};
use std::fmt;

/// Outcome of firing one request `burst` times at once.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ProbeReport {
    #[getset(skip)]
    label: String,
    completed: usize,
    suppressed: usize,
    failed: usize,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} completed, {} suppressed as duplicates, {} failed",
            self.label, self.completed, self.suppressed, self.failed
        )
    }
}

/// Dispatch `burst` identical copies of `request` concurrently through `client`.
///
/// All copies are polled before any of them can settle, so with the guard
/// enabled exactly one reaches the transport.
pub async fn run_burst<T: Transport>(
    client: &GuardedClient<T>,
    request: &ProbeRequest,
    burst: usize,
) -> ProbeReport {
    let label = format!("{} {}", request.method(), request.url());
    info!("Firing {} x {}", burst, label);

    let results = join_all((0..burst).map(|_| client.dispatch(request.descriptor()))).await;

    let mut report = ProbeReport {
        label,
        completed: 0,
        suppressed: 0,
        failed: 0,
    };
    for result in results {
        match result {
            Ok(_) => report.completed += 1,
            Err(err) if err.is_duplicate() => report.suppressed += 1,
            Err(err) => {
                warn!("{} failed: {}", report.label, err);
                report.failed += 1;
            }
        }
    }
    report
}
