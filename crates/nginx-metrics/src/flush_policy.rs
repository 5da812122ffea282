// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decides when the current aggregation window closes.
//!
//! Two triggers race: a line count and the wall-clock age of the window.
//! Both are checked after every consumed line; there is no separate timer, so
//! an idle input never flushes on its own.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    BatchSize,
    BatchInterval,
}

#[derive(Debug)]
pub struct FlushPolicy {
    batch_size: usize,
    batch_interval: Duration,
    lines_since_flush: usize,
    last_flush: Instant,
}

impl FlushPolicy {
    #[must_use]
    pub fn new(batch_size: usize, batch_interval: Duration, now: Instant) -> Self {
        FlushPolicy {
            batch_size,
            batch_interval,
            lines_since_flush: 0,
            last_flush: now,
        }
    }

    /// Counts one line and reports whether the window should be flushed.
    pub fn record_line(&mut self, now: Instant) -> Option<FlushReason> {
        self.lines_since_flush += 1;
        if self.lines_since_flush >= self.batch_size {
            Some(FlushReason::BatchSize)
        } else if now.saturating_duration_since(self.last_flush) >= self.batch_interval {
            Some(FlushReason::BatchInterval)
        } else {
            None
        }
    }

    /// Starts a new window. Called after every flush attempt, successful or not.
    pub fn reset(&mut self, now: Instant) {
        self.lines_since_flush = 0;
        self.last_flush = now;
    }

    #[must_use]
    pub fn lines_since_flush(&self) -> usize {
        self.lines_since_flush
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_trigger_before_interval() {
        let start = Instant::now();
        let mut policy = FlushPolicy::new(3, Duration::from_secs(60), start);
        assert_eq!(policy.record_line(start), None);
        assert_eq!(policy.record_line(start), None);
        assert_eq!(policy.record_line(start), Some(FlushReason::BatchSize));
    }

    #[test]
    fn test_interval_trigger_before_count() {
        let start = Instant::now();
        let mut policy = FlushPolicy::new(100, Duration::from_secs(5), start);
        assert_eq!(policy.record_line(start + Duration::from_secs(1)), None);
        assert_eq!(
            policy.record_line(start + Duration::from_secs(5)),
            Some(FlushReason::BatchInterval)
        );
        assert_eq!(policy.lines_since_flush(), 2);
    }

    #[test]
    fn test_reset_restarts_both_triggers() {
        let start = Instant::now();
        let mut policy = FlushPolicy::new(2, Duration::from_secs(5), start);
        policy.record_line(start);
        assert_eq!(policy.record_line(start), Some(FlushReason::BatchSize));

        let later = start + Duration::from_secs(10);
        policy.reset(later);
        assert_eq!(policy.lines_since_flush(), 0);
        assert_eq!(policy.record_line(later + Duration::from_secs(4)), None);
        assert_eq!(
            policy.record_line(later + Duration::from_secs(4)),
            Some(FlushReason::BatchSize)
        );
    }

    #[test]
    fn test_zero_batch_size_flushes_every_line() {
        let start = Instant::now();
        let mut policy = FlushPolicy::new(0, Duration::from_secs(5), start);
        assert_eq!(policy.record_line(start), Some(FlushReason::BatchSize));
        policy.reset(start);
        assert_eq!(policy.record_line(start), Some(FlushReason::BatchSize));
    }

    #[test]
    fn test_zero_interval_flushes_every_line() {
        let start = Instant::now();
        let mut policy = FlushPolicy::new(100, Duration::ZERO, start);
        assert_eq!(policy.record_line(start), Some(FlushReason::BatchInterval));
    }
}
