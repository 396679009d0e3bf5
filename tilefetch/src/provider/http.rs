//! HTTP client abstraction for testability

use std::future::Future;

use tracing::{debug, trace, warn};

use super::{Connectivity, TransportError};
use crate::config::DownloaderConfig;

/// Default User-Agent string for tile requests.
/// Many public tile servers reject requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("tilefetch/", env!("CARGO_PKG_VERSION"));

/// Transport used by the download scheduler.
pub trait NetworkClient: Send + Sync + 'static {
    /// Fetches the body behind `url`.
    ///
    /// Non-success statuses are errors.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Whether the device currently has network access.
    ///
    /// Downloads requested while offline are ignored.
    fn is_online(&self) -> bool;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestTileClient {
    client: reqwest::Client,
    connectivity: Connectivity,
}

impl ReqwestTileClient {
    /// Creates a client with the timeout and user agent from `config`.
    pub fn new(config: &DownloaderConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            // One idle connection per worker is enough to stay warm
            .pool_max_idle_per_host(config.concurrency_limit)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            connectivity: Connectivity::default(),
        })
    }

    /// Shares an externally driven connectivity flag.
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }
}

impl NetworkClient for ReqwestTileClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(TransportError::Request(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        trace!(url = url, bytes = bytes.len(), "HTTP response body read");
        Ok(bytes.to_vec())
    }

    fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }
}
