use super::{Transport, TransportResponse};
use crate::error::TransportError;
use crate::request::RequestDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

enum Outcome {
    Respond(Value),
    Fail { status: u16, body: String },
    Panic,
}

/// In-memory transport that counts the calls reaching it.
pub(crate) struct MockTransport {
    outcome: Outcome,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl MockTransport {
    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(vec![]),
        }
    }

    pub(crate) fn ok(body: Value) -> Self {
        Self::with_outcome(Outcome::Respond(body))
    }

    pub(crate) fn failing(status: u16, body: &str) -> Self {
        Self::with_outcome(Outcome::Fail {
            status,
            body: body.to_string(),
        })
    }

    pub(crate) fn panicking() -> Self {
        Self::with_outcome(Outcome::Panic)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        // always yield once so callers observe the request as in flight
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }

        match &self.outcome {
            Outcome::Respond(body) => Ok(TransportResponse::new(
                200,
                BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
                serde_json::to_vec(body).unwrap(),
            )),
            Outcome::Fail { status, body } => Err(TransportError::Status {
                status: *status,
                body: body.clone(),
            }),
            Outcome::Panic => panic!("transport exploded"),
        }
    }
}
