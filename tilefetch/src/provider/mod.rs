//! Network transport for tile fetches.
//!
//! The scheduler only needs two things from the network: fetch the bytes
//! behind a URL, and tell whether the device is online at all. Both sit
//! behind [`NetworkClient`] so tests can script responses without a server.

mod http;

pub use http::{NetworkClient, ReqwestTileClient, DEFAULT_USER_AGENT};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Errors from a single tile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be sent or timed out
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body could not be read
    #[error("Failed to read response: {0}")]
    Body(String),

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Shared online/offline flag.
///
/// Cloning shares the flag, so the host application can flip it from its
/// own connectivity monitor while a client holds a copy.
#[derive(Debug, Clone)]
pub struct Connectivity {
    online: Arc<AtomicBool>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Release);
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_clones_share_state() {
        let flag = Connectivity::default();
        let observer = flag.clone();
        assert!(observer.is_online());

        flag.set_online(false);
        assert!(!observer.is_online());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status {
            status: 404,
            url: "https://tile.example/1/0/0".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://tile.example/1/0/0");
    }
}
