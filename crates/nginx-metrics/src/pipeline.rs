// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The ingestion loop: line → record → window → flush → truncation.
//!
//! A single task owns all state. A flush is awaited inline, so a slow ingest
//! endpoint holds up reading for up to the delivery timeout; nothing is
//! buffered beyond what the OS keeps in the file itself. Stopping the loop
//! drops the open window unflushed.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::access_log;
use crate::aggregator::{AggregationWindow, Aggregator};
use crate::config::Config;
use crate::constants::TRUNCATE_AFTER_LINES;
use crate::flush_policy::{FlushPolicy, FlushReason};
use crate::flusher::{DeliveryResult, MetricsEmitter};
use crate::tailer::LogFollower;
use crate::truncation::TruncationManager;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub input_file: PathBuf,
    pub batch_size: usize,
    pub batch_interval: Duration,
    pub uri_as_dimension: bool,
    pub truncate_after_lines: u64,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        PipelineSettings {
            input_file: config.input_file.clone(),
            batch_size: config.batch_size,
            batch_interval: config.batch_interval,
            uri_as_dimension: config.uri_as_dimension,
            truncate_after_lines: TRUNCATE_AFTER_LINES,
        }
    }
}

/// What happened while processing one line.
#[derive(Debug, Default)]
pub struct LineOutcome {
    pub parsed: bool,
    pub flushed: Option<(FlushReason, DeliveryResult)>,
    pub truncated: bool,
}

pub struct Pipeline<E: MetricsEmitter> {
    aggregator: Aggregator,
    flush_policy: FlushPolicy,
    emitter: E,
    truncation: TruncationManager,
}

impl<E: MetricsEmitter> Pipeline<E> {
    #[must_use]
    pub fn new(settings: PipelineSettings, emitter: E) -> Self {
        Pipeline {
            aggregator: Aggregator::new(settings.uri_as_dimension),
            flush_policy: FlushPolicy::new(
                settings.batch_size,
                settings.batch_interval,
                Instant::now(),
            ),
            emitter,
            truncation: TruncationManager::new(
                settings.input_file,
                settings.truncate_after_lines,
            ),
        }
    }

    pub async fn process_line(&mut self, line: &str) -> LineOutcome {
        self.process_line_at(line, Instant::now()).await
    }

    /// Processes one line as if it arrived at `now`.
    pub async fn process_line_at(&mut self, line: &str, now: Instant) -> LineOutcome {
        let mut outcome = LineOutcome::default();
        self.truncation.record_line();

        if let Some(record) = access_log::parse_or_log(line) {
            self.aggregator.absorb(&record);
            outcome.parsed = true;
        }

        if let Some(reason) = self.flush_policy.record_line(now) {
            debug!("Flushing window ({reason:?})");
            let window = self.aggregator.take_window();
            let result = self.emitter.flush(&window).await;
            self.flush_policy.reset(Instant::now().max(now));
            outcome.flushed = Some((reason, result));
        }

        outcome.truncated = self.truncation.maybe_truncate().await;
        outcome
    }

    /// Feeds every line from `follower` through the pipeline until cancelled.
    pub async fn run(
        &mut self,
        follower: &mut LogFollower,
        cancel: &CancellationToken,
    ) -> io::Result<()> {
        while let Some(line) = follower.next_line(cancel).await? {
            self.process_line(&line).await;
        }
        info!(
            "Ingestion stopped, dropping {} unflushed metrics",
            self.aggregator.window().len()
        );
        Ok(())
    }

    #[must_use]
    pub fn window(&self) -> &AggregationWindow {
        self.aggregator.window()
    }

    #[must_use]
    pub fn lines_since_flush(&self) -> usize {
        self.flush_policy.lines_since_flush()
    }

    #[must_use]
    pub fn lines_since_truncation(&self) -> u64 {
        self.truncation.lines_since_truncation()
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn emitter(&self) -> &E {
        &self.emitter
    }
}
