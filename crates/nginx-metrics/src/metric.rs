// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Metric identity: the three counter families derived from each request and
//! the composite key that selects one accumulator within a window.

use crate::access_log::AccessLogRecord;

/// Counter families accumulated for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    /// +1 per request.
    RequestCount,
    /// Sum of `request_time`.
    TotalTime,
    /// Sum of `body_bytes_sent`.
    TotalBytes,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 3] = [
        MetricFamily::RequestCount,
        MetricFamily::TotalTime,
        MetricFamily::TotalBytes,
    ];

    /// Name reported to the ingest endpoint.
    #[must_use]
    pub fn metric_name(self) -> &'static str {
        match self {
            MetricFamily::RequestCount => "nginx_http_requests_count",
            MetricFamily::TotalTime => "nginx_http_requests_totalTime",
            MetricFamily::TotalBytes => "nginx_http_requests_totalBytes",
        }
    }

    /// The amount one record contributes to this family.
    #[must_use]
    pub fn value_of(self, record: &AccessLogRecord) -> f64 {
        match self {
            MetricFamily::RequestCount => 1.0,
            MetricFamily::TotalTime => record.request_time,
            MetricFamily::TotalBytes => record.body_bytes_sent,
        }
    }
}

/// Identifies one accumulator. Fields are compared structurally, so no two
/// distinct field combinations can collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DimensionKey {
    pub status_code: String,
    /// Empty when the uri is not used as a dimension.
    pub uri: String,
    pub method: String,
    pub server_protocol: String,
    pub family: MetricFamily,
}

impl DimensionKey {
    /// Builds the key for `family`. With `uri_as_dimension` off, the uri is
    /// forced empty so every uri lands in the same accumulator.
    #[must_use]
    pub fn from_record(
        record: &AccessLogRecord,
        family: MetricFamily,
        uri_as_dimension: bool,
    ) -> Self {
        DimensionKey {
            status_code: record.status.clone(),
            uri: if uri_as_dimension {
                record.uri.clone()
            } else {
                String::new()
            },
            method: record.method.clone(),
            server_protocol: record.server_protocol.clone(),
            family,
        }
    }

    #[must_use]
    pub fn metric_name(&self) -> &'static str {
        self.family.metric_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uri: &str) -> AccessLogRecord {
        AccessLogRecord {
            uri: uri.to_string(),
            method: "POST".to_string(),
            server_protocol: "HTTP/2.0".to_string(),
            status: "201".to_string(),
            body_bytes_sent: 10.0,
            request_time: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_uri_zeroed_when_not_a_dimension() {
        let a = DimensionKey::from_record(&record("/a"), MetricFamily::RequestCount, false);
        let b = DimensionKey::from_record(&record("/b"), MetricFamily::RequestCount, false);
        assert_eq!(a, b);
        assert_eq!(a.uri, "");
    }

    #[test]
    fn test_uri_kept_when_a_dimension() {
        let a = DimensionKey::from_record(&record("/a"), MetricFamily::RequestCount, true);
        let b = DimensionKey::from_record(&record("/b"), MetricFamily::RequestCount, true);
        assert_ne!(a, b);
        assert_eq!(a.uri, "/a");
    }

    #[test]
    fn test_fields_do_not_collide() {
        // concatenation of "2"+"01" and "20"+"1" would be ambiguous
        let mut left = record("/x");
        left.status = "2".to_string();
        left.method = "01".to_string();
        let mut right = record("/x");
        right.status = "20".to_string();
        right.method = "1".to_string();
        assert_ne!(
            DimensionKey::from_record(&left, MetricFamily::TotalBytes, true),
            DimensionKey::from_record(&right, MetricFamily::TotalBytes, true)
        );
    }

    #[test]
    fn test_family_values() {
        let r = record("/");
        assert_eq!(MetricFamily::RequestCount.value_of(&r), 1.0);
        assert_eq!(MetricFamily::TotalTime.value_of(&r), 0.5);
        assert_eq!(MetricFamily::TotalBytes.value_of(&r), 10.0);
    }

    #[test]
    fn test_metric_names() {
        let names: Vec<&str> = MetricFamily::ALL.iter().map(|f| f.metric_name()).collect();
        assert_eq!(
            names,
            vec![
                "nginx_http_requests_count",
                "nginx_http_requests_totalTime",
                "nginx_http_requests_totalBytes"
            ]
        );
    }
}
