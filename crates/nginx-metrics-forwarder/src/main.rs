// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use nginx_metrics::{
    config::{self, Config},
    constants::{FILE_WAIT_INTERVAL, FOLLOW_POLL_INTERVAL},
    flusher::{Flusher, FlusherConfig},
    pipeline::{Pipeline, PipelineSettings},
    signalfx::SfxApi,
    tailer::{wait_for_file, LogFollower},
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
pub async fn main() -> ExitCode {
    let log_level = if config::debug_enabled() { "debug" } else { "info" };
    let env_filter = format!("h2=off,hyper=off,rustls=off,reqwest=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        "{}, Version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let config = match Config::new() {
        Ok(c) => c,
        Err(e) => {
            error!("one or more required environment variables missing or invalid, aborting: {e}");
            return ExitCode::from(8);
        }
    };

    let api = match SfxApi::new(
        config.sfx_url.clone(),
        config.sfx_token.clone(),
        config.delivery_timeout,
        config.skip_ssl_validation,
    ) {
        Ok(api) => api,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let flusher = Flusher::new(FlusherConfig {
        api,
        metadata: config.metadata.clone(),
        uri_as_dimension: config.uri_as_dimension,
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("received shutdown signal");
            signal_cancel.cancel();
        }
    });

    if !wait_for_file(&config.input_file, FILE_WAIT_INTERVAL, &cancel).await {
        return ExitCode::SUCCESS;
    }

    let mut follower = match LogFollower::open(&config.input_file, FOLLOW_POLL_INTERVAL).await {
        Ok(follower) => follower,
        Err(e) => {
            error!("failed to open {}: {e}", config.input_file.display());
            return ExitCode::FAILURE;
        }
    };

    let mut pipeline = Pipeline::new(PipelineSettings::from(&config), flusher);
    match pipeline.run(&mut follower, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("failed reading {}: {e}", config.input_file.display());
            ExitCode::FAILURE
        }
    }
}
