use crate::error::TransportError;
use crate::request::RequestDescriptor;
use async_trait::async_trait;
use getset::{CopyGetters, Getters};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(test)]
pub(crate) mod mock;
mod surf_transport;

pub use surf_transport::SurfTransport;

/// Anything that can put a [`RequestDescriptor`] on the wire.
///
/// Implementations own timeouts and status handling. Dropping the returned
/// future must cancel the call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// A settled HTTP exchange. Header names are stored lowercase.
#[derive(Clone, Debug, PartialEq, Getters, CopyGetters)]
pub struct TransportResponse {
    #[getset(get_copy = "pub")]
    status: u16,
    #[getset(get = "pub")]
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> Result<String, TransportError> {
        String::from_utf8(self.body.clone()).map_err(|err| TransportError::Decode(err.to_string()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|err| TransportError::Decode(err.to_string()))
    }
}
