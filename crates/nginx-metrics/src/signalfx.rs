// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! SignalFx ingest wire format and the HTTP client that delivers it.
//!
//! A payload is a single JSON document:
//!
//! ```json
//! {"counter":[{"metric":"nginx_http_requests_count","value":2.0,
//!   "dimensions":{"method":"GET","server_protocol":"HTTP/1.1","status_code":"200",
//!                 "cfenv":"","cf_instance_index":"","cf_app_name":"",
//!                 "cf_app_id":"","cf_space_name":"","cf_org_name":""}}]}
//! ```

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::DeploymentMetadata;
use crate::errors::{ConfigError, ShippingError};
use crate::token::IngestToken;

pub const TOKEN_HEADER: &str = "X-SF-Token";

#[derive(Debug, Serialize)]
pub struct CounterMetrics<'a> {
    pub counter: Vec<CounterMetric<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CounterMetric<'a> {
    pub metric: &'a str,
    pub value: f64,
    pub dimensions: Dimensions<'a>,
}

#[derive(Debug, Serialize)]
pub struct Dimensions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<&'a str>,
    pub method: &'a str,
    pub server_protocol: &'a str,
    pub status_code: &'a str,
    #[serde(flatten)]
    pub deployment: &'a DeploymentMetadata,
}

/// Client for one ingest endpoint.
#[derive(Debug, Clone)]
pub struct SfxApi {
    client: reqwest::Client,
    url: String,
    token: IngestToken,
    timeout: Duration,
}

impl SfxApi {
    pub fn new(
        url: String,
        token: IngestToken,
        timeout: Duration,
        skip_ssl_validation: bool,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(skip_ssl_validation)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(SfxApi {
            client,
            url,
            token,
            timeout,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POSTs an already serialized payload. Only `200 OK` counts as success.
    pub async fn ship(&self, body: Vec<u8>) -> Result<(), ShippingError> {
        let resp = self
            .client
            .post(&self.url)
            .header(TOKEN_HEADER, self.token.expose())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let detail = if e.is_timeout() {
                    format!("timed out after {:?}", self.timeout)
                } else {
                    error_chain(&e)
                };
                ShippingError::Destination(
                    e.status(),
                    format!("failed to send metrics to {}: {detail}", self.url),
                )
            })?;

        match resp.status() {
            StatusCode::OK => {
                debug!("ingest endpoint accepted payload");
                Ok(())
            }
            unexpected_status_code => {
                let body = resp.text().await.unwrap_or_default();
                Err(ShippingError::Destination(
                    Some(unexpected_status_code),
                    format!(
                        "response from POST to {}: {unexpected_status_code}\n{body}",
                        self.url
                    ),
                ))
            }
        }
    }
}

/// Renders an error with its sources; reqwest's own message omits the cause.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut rendered = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
