// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of nginx access-log lines written with a JSON `log_format`.
//!
//! Every field is optional on the wire and defaults to its zero value, as does
//! an explicit `null`. A repeated key keeps its last value. A line only fails
//! to decode when it is not a JSON object or a field has the wrong JSON type. No semantic validation happens here: empty strings,
//! negative numbers and unknown status codes all pass through untouched.

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::errors::ParseError;

/// One request as logged by nginx.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccessLogRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub server_protocol: String,
    #[serde(deserialize_with = "null_as_default")]
    pub request: String,
    /// Kept as a string: nginx logs `$status` verbatim.
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body_bytes_sent: f64,
    /// Seconds, with millisecond resolution.
    #[serde(deserialize_with = "null_as_default")]
    pub request_time: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes one raw line.
pub fn parse(line: &str) -> Result<AccessLogRecord, ParseError> {
    // decoding into a map first lets a repeated key overwrite the earlier one
    let value: serde_json::Value = serde_json::from_str(line)?;
    Ok(AccessLogRecord::deserialize(value)?)
}

/// Decodes one raw line, logging and dropping it on failure.
pub fn parse_or_log(line: &str) -> Option<AccessLogRecord> {
    match parse(line) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Failed to parse log line {line:?}: {e}");
            None
        }
    }
}
