// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use tracing::{debug, error};

use crate::aggregator::AggregationWindow;
use crate::config::DeploymentMetadata;
use crate::errors::ShippingError;
use crate::signalfx::{CounterMetric, CounterMetrics, Dimensions, SfxApi};

/// Outcome of one flush. Delivery is attempted once; callers reset their
/// window whatever the outcome.
#[derive(Debug)]
pub enum DeliveryResult {
    Delivered { metrics: usize },
    /// The window was empty; nothing was sent.
    Skipped,
    Failed(ShippingError),
}

#[async_trait]
pub trait MetricsEmitter: Send {
    /// Serializes and delivers one closed window.
    async fn flush(&mut self, window: &AggregationWindow) -> DeliveryResult;
}

pub struct FlusherConfig {
    pub api: SfxApi,
    pub metadata: DeploymentMetadata,
    pub uri_as_dimension: bool,
}

/// Ships windows to a SignalFx ingest endpoint without retrying.
#[derive(Debug, Clone)]
pub struct Flusher {
    api: SfxApi,
    metadata: DeploymentMetadata,
    uri_as_dimension: bool,
}

impl Flusher {
    #[must_use]
    pub fn new(config: FlusherConfig) -> Self {
        Flusher {
            api: config.api,
            metadata: config.metadata,
            uri_as_dimension: config.uri_as_dimension,
        }
    }

    /// Builds the wire payload for `window`.
    pub fn to_payload<'a>(&'a self, window: &'a AggregationWindow) -> CounterMetrics<'a> {
        let counter = window
            .iter()
            .map(|(key, value)| CounterMetric {
                metric: key.metric_name(),
                value,
                dimensions: Dimensions {
                    // an empty uri is left out rather than sent as ""
                    uri: self
                        .uri_as_dimension
                        .then_some(key.uri.as_str())
                        .filter(|uri| !uri.is_empty()),
                    method: &key.method,
                    server_protocol: &key.server_protocol,
                    status_code: &key.status_code,
                    deployment: &self.metadata,
                },
            })
            .collect();
        CounterMetrics { counter }
    }

    pub fn serialize(&self, window: &AggregationWindow) -> Result<Vec<u8>, ShippingError> {
        serde_json::to_vec(&self.to_payload(window))
            .map_err(|e| ShippingError::Payload(e.to_string()))
    }
}

#[async_trait]
impl MetricsEmitter for Flusher {
    async fn flush(&mut self, window: &AggregationWindow) -> DeliveryResult {
        if window.is_empty() {
            debug!("Nothing to flush");
            return DeliveryResult::Skipped;
        }
        let metrics = window.len();
        let body = match self.serialize(window) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to prepare payload. Data dropped: {e}");
                return DeliveryResult::Failed(e);
            }
        };
        debug!(
            "sending {metrics} metrics to {}: {}",
            self.api.url(),
            String::from_utf8_lossy(&body)
        );
        match self.api.ship(body).await {
            Ok(()) => {
                debug!("Successfully flushed {metrics} metrics");
                DeliveryResult::Delivered { metrics }
            }
            Err(e) => {
                error!("Failed to flush {metrics} metrics: {e}");
                DeliveryResult::Failed(e)
            }
        }
    }
}
