//! Logging setup and in-process counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` selects verbose output for
/// this crate and the HTTP layer.
pub fn init_tracing(debug: bool) {
    let fallback = if debug {
        "teamster=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second call (tests, repeated init) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    manifests_served: AtomicU64,
    manifest_failures: AtomicU64,
    files_served: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest_served(&self) {
        self.manifests_served.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "manifests_served", "Metric incremented");
    }

    pub fn manifest_failed(&self) {
        self.manifest_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "manifest_failures", "Metric incremented");
    }

    pub fn file_served(&self) {
        self.files_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            manifests_served: self.manifests_served.load(Ordering::Relaxed),
            manifest_failures: self.manifest_failures.load(Ordering::Relaxed),
            files_served: self.files_served.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub manifests_served: u64,
    pub manifest_failures: u64,
    pub files_served: u64,
}
