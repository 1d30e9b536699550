//! Backend server management
//!
//! This module holds the fixed pool of backend servers and the round-robin
//! cursor used to pick one for each incoming request.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Mutex;

use crate::config::BackendConfig;

/// Represents a backend server with its metadata
#[derive(Debug, Clone)]
pub struct Backend {
    /// Backend base URL (e.g., "http://localhost:3000/")
    pub url: String,

    /// Optional backend name for logging
    pub name: Option<String>,
}

impl Backend {
    /// Create a new backend from configuration
    pub fn new(config: BackendConfig) -> Self {
        Self {
            url: config.url,
            name: config.name,
        }
    }

    /// Get a display name for the backend (name or URL)
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// Fixed pool of backend servers with a round-robin selection cursor.
///
/// The pool never changes after construction; the only shared mutable
/// state is the cursor, guarded by a mutex so that increment-and-read is
/// a single critical section. Two concurrent callers can therefore never
/// observe the same cursor value or skip one: the selection sequence is
/// strictly cyclic under any interleaving.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Arc<Vec<Backend>>,
    cursor: Arc<Mutex<usize>>,
}

impl BackendPool {
    /// Create a new backend pool from configuration.
    ///
    /// An empty pool or a backend URL that does not parse as an absolute
    /// URL with a host is a configuration error, fatal before any request
    /// is served.
    pub fn new(configs: Vec<BackendConfig>) -> anyhow::Result<Self> {
        if configs.is_empty() {
            anyhow::bail!("backend pool is empty, at least one backend is required");
        }

        for config in &configs {
            let parsed = url::Url::parse(&config.url)
                .with_context(|| format!("invalid backend URL: {}", config.url))?;
            if parsed.host_str().is_none() {
                anyhow::bail!("backend URL has no host: {}", config.url);
            }
        }

        let backends: Vec<Backend> = configs.into_iter().map(Backend::new).collect();
        // Cursor starts on the last entry so the first selection wraps to
        // the first.
        let cursor = backends.len() - 1;

        Ok(Self {
            backends: Arc::new(backends),
            cursor: Arc::new(Mutex::new(cursor)),
        })
    }

    /// Select the next backend, round-robin.
    ///
    /// Never fails: the pool is non-empty by construction, and an
    /// unreachable backend is still returned. Failure handling belongs to
    /// the forwarder.
    pub async fn next(&self) -> Backend {
        let mut cursor = self.cursor.lock().await;
        *cursor = (*cursor + 1) % self.backends.len();
        self.backends[*cursor].clone()
    }

    /// Number of backends in the pool
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
