//! Interactions endpoint configuration.

use super::defaults::{default_http_address, default_response_timeout_ms, default_true};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// HTTP listener for the interactions webhook and metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to bind to (default: 0.0.0.0:8080).
    #[serde(default = "default_http_address")]
    pub address: SocketAddr,
    /// Serve `/metrics` on the same listener (default: true).
    #[serde(default = "default_true")]
    pub metrics: bool,
    /// How long to wait for the dispatcher's first response before sending a
    /// deferred acknowledgement instead (default: 2500).
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl HttpConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            metrics: true,
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}
