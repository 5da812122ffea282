// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Follows a growing log file line by line, `tail -f` style.
//!
//! Reading starts at offset 0. At end of file the follower sleeps for the
//! poll interval and tries again. When the file becomes shorter than the
//! current read offset it is assumed to have been truncated, and reading
//! restarts from the beginning. A file that shrinks and regrows past the old
//! offset within one poll interval is not detected.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Waits until `path` exists. Returns `false` if cancelled first.
pub async fn wait_for_file(path: &Path, poll: Duration, cancel: &CancellationToken) -> bool {
    loop {
        if fs::try_exists(path).await.unwrap_or(false) {
            return true;
        }
        info!("waiting for file {} to appear...", path.display());
        tokio::select! {
            () = sleep(poll) => {}
            () = cancel.cancelled() => return false,
        }
    }
}

pub struct LogFollower {
    path: PathBuf,
    reader: BufReader<File>,
    offset: u64,
    partial: Vec<u8>,
    poll_interval: Duration,
}

impl LogFollower {
    pub async fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> io::Result<Self> {
        let path = path.into();
        let file = File::open(&path).await?;
        info!("following {}", path.display());
        Ok(LogFollower {
            path,
            reader: BufReader::new(file),
            offset: 0,
            partial: Vec::new(),
            poll_interval,
        })
    }

    /// Returns the next complete line without its terminator, waiting for
    /// one to be written if necessary. `None` means cancelled.
    pub async fn next_line(&mut self, cancel: &CancellationToken) -> io::Result<Option<String>> {
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let read = self.reader.read_until(b'\n', &mut self.partial).await?;
            self.offset += read as u64;
            if self.partial.last() == Some(&b'\n') {
                let mut line = std::mem::take(&mut self.partial);
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            self.rewind_if_truncated().await?;

            tokio::select! {
                () = sleep(self.poll_interval) => {}
                () = cancel.cancelled() => return Ok(None),
            }
        }
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    async fn rewind_if_truncated(&mut self) -> io::Result<()> {
        let len = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                debug!("metadata for {} unavailable: {e}", self.path.display());
                return Ok(());
            }
        };
        if len < self.offset {
            warn!(
                "{} truncated (offset {}, size {len}), following from the start",
                self.path.display(),
                self.offset
            );
            self.reader.seek(SeekFrom::Start(0)).await?;
            self.offset = 0;
            self.partial.clear();
        }
        Ok(())
    }
}
