// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Error types for the access-log metrics pipeline.

use reqwest::StatusCode;

/// A single access-log line could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse access log line: {0}")]
pub struct ParseError(#[from] pub serde_json::Error);

/// Why a window did not reach the ingest endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    /// The window could not be serialized; nothing was sent.
    #[error("failed to prepare payload: {0}")]
    Payload(String),
    /// Transport failure (no status) or a response other than 200 OK.
    #[error("failed to ship payload ({0:?}): {1}")]
    Destination(Option<StatusCode>, String),
}

/// Startup configuration problems. These are fatal: ingestion never starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("failed reading environment variable {var}={value:?}: {source}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("missing NGINX2SFX_TOKEN and no \"sfxtoken\" credhub service instance bound")]
    MissingToken,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
