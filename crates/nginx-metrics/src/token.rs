// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::fmt::Debug;
use tracing::{debug, error};

use crate::constants::CREDHUB_TOKEN_INSTANCE;
use crate::errors::ConfigError;

/// Ingest token sent in the `X-SF-Token` header. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestToken(String);

impl IngestToken {
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for IngestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IngestToken(<redacted>)")
    }
}

#[derive(Debug, Default, Deserialize)]
struct VcapServices {
    #[serde(default)]
    credhub: Vec<VcapService>,
}

#[derive(Debug, Default, Deserialize)]
struct VcapService {
    #[serde(default)]
    instance_name: String,
    #[serde(default)]
    credentials: Credentials,
}

#[derive(Debug, Default, Deserialize)]
struct Credentials {
    #[serde(default)]
    token: Option<String>,
}

/// Picks the ingest token: a bound `sfxtoken` credhub instance in
/// `VCAP_SERVICES` wins over `NGINX2SFX_TOKEN`.
pub fn resolve_token(
    env_token: Option<&str>,
    vcap_services: Option<&str>,
) -> Result<IngestToken, ConfigError> {
    if let Some(token) = vcap_services.and_then(token_from_credhub) {
        debug!("got ingest token from credhub");
        return Ok(IngestToken::new(&token));
    }
    match env_token {
        Some(token) if !token.is_empty() => Ok(IngestToken::new(token)),
        _ => Err(ConfigError::MissingToken),
    }
}

fn token_from_credhub(vcap_services: &str) -> Option<String> {
    let services: VcapServices = match serde_json::from_str(vcap_services) {
        Ok(services) => services,
        Err(e) => {
            error!("could not get ingest token from credhub: {e}");
            return None;
        }
    };
    services
        .credhub
        .into_iter()
        .filter(|service| service.instance_name == CREDHUB_TOKEN_INSTANCE)
        .filter_map(|service| service.credentials.token)
        .find(|token| !token.is_empty())
}
