use crate::fingerprint::Fingerprint;
use std::time::Duration;
use strum_macros::Display;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures produced by a [`Transport`](crate::transport::Transport).
///
/// The guard never interprets these; they reach the caller exactly as the
/// transport produced them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("server responded with status {status}")]
    Status { status: u16, body: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An identical request is still in flight. Never reached the transport.
    #[error("duplicate request suppressed, an identical request is still in flight ({fingerprint})")]
    Duplicate { fingerprint: Fingerprint },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    Duplicate,
    Transport,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Duplicate { .. } => ErrorKind::Duplicate,
            Error::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.kind() == ErrorKind::Duplicate
    }
}

/// Lets UI-facing callers drop duplicate suppressions silently.
pub trait SuppressDuplicate<T> {
    /// `Err(Duplicate)` becomes `Ok(None)`, transport errors pass through.
    fn suppress_duplicate(self) -> std::result::Result<Option<T>, TransportError>;
}

impl<T> SuppressDuplicate<T> for Result<T> {
    fn suppress_duplicate(self) -> std::result::Result<Option<T>, TransportError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(Error::Duplicate { fingerprint }) => {
                log::trace!("Ignoring duplicate request {}", fingerprint);
                Ok(None)
            }
            Err(Error::Transport(err)) => Err(err),
        }
    }
}
