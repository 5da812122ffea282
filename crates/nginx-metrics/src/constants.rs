// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

pub const DEFAULT_INPUT_FILE: &str = "logs/nginx2sfx.log";
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Seconds.
pub const DEFAULT_BATCH_INTERVAL: u64 = 5;

/// Timeout for a single delivery to the ingest endpoint.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Lines consumed since the last truncation before the input file is reset
/// to zero length.
pub const TRUNCATE_AFTER_LINES: u64 = 5000;

/// How often the follower re-checks the input file once it has hit EOF.
pub const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// How often startup re-checks for a missing input file.
pub const FILE_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// Name of the credhub service instance holding the ingest token.
pub const CREDHUB_TOKEN_INSTANCE: &str = "sfxtoken";
