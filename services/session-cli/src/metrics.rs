//! Prometheus snapshot of the session counters
//!
//! The CLI is short-lived, so there is no scrape endpoint. With `--metrics`
//! the recorder is installed at startup and its text exposition is written
//! to stderr before exit.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
