// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory accumulation of request counters between two flushes.

use hashbrown::hash_map::{Entry, HashMap};

use crate::access_log::AccessLogRecord;
use crate::metric::{DimensionKey, MetricFamily};

/// The accumulators collected since the last flush.
#[derive(Debug, Clone, Default)]
pub struct AggregationWindow {
    values: HashMap<DimensionKey, f64>,
}

impl AggregationWindow {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &DimensionKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DimensionKey, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Adds `value` to the accumulator for `key`. A new key starts at `value`
    /// itself rather than at zero.
    pub fn add(&mut self, key: DimensionKey, value: f64) {
        match self.values.entry(key) {
            Entry::Occupied(mut entry) => *entry.get_mut() += value,
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
}

/// Folds access-log records into the current [`AggregationWindow`].
#[derive(Debug, Default)]
pub struct Aggregator {
    window: AggregationWindow,
    uri_as_dimension: bool,
}

impl Aggregator {
    #[must_use]
    pub fn new(uri_as_dimension: bool) -> Self {
        Aggregator {
            window: AggregationWindow::default(),
            uri_as_dimension,
        }
    }

    /// Adds one record to all three counter families.
    pub fn absorb(&mut self, record: &AccessLogRecord) {
        for family in MetricFamily::ALL {
            let key = DimensionKey::from_record(record, family, self.uri_as_dimension);
            self.window.add(key, family.value_of(record));
        }
    }

    #[must_use]
    pub fn window(&self) -> &AggregationWindow {
        &self.window
    }

    /// Hands the current window to the caller and starts a fresh, empty one.
    pub fn take_window(&mut self) -> AggregationWindow {
        std::mem::take(&mut self.window)
    }
}
