// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns an nginx JSON access log into request counters shipped to SignalFx.
//!
//! Lines are read from a followed file, decoded, and folded into per-window
//! accumulators keyed by status code, method, protocol and (optionally) uri.
//! A window closes after a number of lines or an amount of time, whichever
//! comes first, and is delivered once without retry. The file itself is
//! truncated periodically so it does not grow forever.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod access_log;
pub mod aggregator;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flush_policy;
pub mod flusher;
pub mod metric;
pub mod pipeline;
pub mod signalfx;
pub mod tailer;
pub mod token;
pub mod truncation;
