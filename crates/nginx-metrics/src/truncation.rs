// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Keeps the followed access log from growing without bound.
//!
//! The file is cut to zero length in place while nginx keeps appending to it
//! and the follower keeps reading it. Nothing coordinates the three: the
//! follower notices the shrink on its next poll and restarts from offset 0,
//! and lines written between the truncate and that poll can be lost. This gap
//! is accepted; locking would change what nginx and the follower observe.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tracing::{debug, error};

#[derive(Debug)]
pub struct TruncationManager {
    path: PathBuf,
    threshold: u64,
    lines_since_truncation: u64,
}

impl TruncationManager {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, threshold: u64) -> Self {
        TruncationManager {
            path: path.into(),
            threshold,
            lines_since_truncation: 0,
        }
    }

    /// Counts one consumed line.
    pub fn record_line(&mut self) {
        self.lines_since_truncation += 1;
    }

    #[must_use]
    pub fn is_due(&self) -> bool {
        self.lines_since_truncation >= self.threshold
    }

    #[must_use]
    pub fn lines_since_truncation(&self) -> u64 {
        self.lines_since_truncation
    }

    /// Truncates the file if the threshold has been reached. The counter is
    /// reset even when truncation fails, so a broken file is retried one
    /// threshold later rather than on every line. Returns whether a
    /// truncation happened.
    pub async fn maybe_truncate(&mut self) -> bool {
        if !self.is_due() {
            return false;
        }
        self.lines_since_truncation = 0;
        match truncate(&self.path).await {
            Ok(()) => {
                debug!("Truncated {}", self.path.display());
                true
            }
            Err(e) => {
                error!("Failed to truncate file {}: {e}", self.path.display());
                false
            }
        }
    }
}

async fn truncate(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path).await?;
    file.set_len(0).await
}
