// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

use crate::constants::{
    DEFAULT_BATCH_INTERVAL, DEFAULT_BATCH_SIZE, DEFAULT_INPUT_FILE, DELIVERY_TIMEOUT,
};
use crate::errors::ConfigError;
use crate::token::{resolve_token, IngestToken};

/// Static dimensions attached to every shipped metric. Resolved once at
/// startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentMetadata {
    #[serde(rename = "cfenv")]
    pub environment: String,
    #[serde(rename = "cf_instance_index")]
    pub instance_index: String,
    #[serde(rename = "cf_app_name")]
    pub app_name: String,
    #[serde(rename = "cf_app_id")]
    pub app_id: String,
    #[serde(rename = "cf_space_name")]
    pub space_name: String,
    #[serde(rename = "cf_org_name")]
    pub org_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VcapApplication {
    application_id: String,
    name: String,
    space_name: String,
    organization_name: String,
}

impl DeploymentMetadata {
    /// Reads `VCAP_APPLICATION`; environment name and instance index are only
    /// picked up when running under Cloud Foundry.
    fn from_env() -> Self {
        let Ok(vcap_application) = env::var("VCAP_APPLICATION") else {
            return DeploymentMetadata::default();
        };
        let app: VcapApplication = serde_json::from_str(&vcap_application).unwrap_or_else(|e| {
            debug!("failed to decode VCAP_APPLICATION: {e}");
            VcapApplication::default()
        });
        DeploymentMetadata {
            environment: env::var("RABOPCF_SYSTEM_ENV").unwrap_or_default(),
            instance_index: env::var("CF_INSTANCE_INDEX").unwrap_or_default(),
            app_name: app.name,
            app_id: app.application_id,
            space_name: app.space_name,
            org_name: app.organization_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input_file: PathBuf,
    pub sfx_url: String,
    pub sfx_token: IngestToken,
    /// Lines per window before a flush.
    pub batch_size: usize,
    /// Maximum window age before a flush.
    pub batch_interval: Duration,
    pub uri_as_dimension: bool,
    pub skip_ssl_validation: bool,
    pub delivery_timeout: Duration,
    pub metadata: DeploymentMetadata,
}

impl Config {
    /// Reads the configuration from the process environment. Every problem is
    /// logged; the first one is returned.
    pub fn new() -> Result<Config, ConfigError> {
        let mut problems: Vec<ConfigError> = Vec::new();

        let input_file = env::var("NGINX2SFX_INPUTFILE")
            .ok()
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_INPUT_FILE.to_string());

        let sfx_url = env::var("NGINX2SFX_URL").unwrap_or_default();
        if sfx_url.is_empty() {
            problems.push(ConfigError::Missing("NGINX2SFX_URL"));
        }

        let batch_size = parse_number("NGINX2SFX_BATCH_SIZE", DEFAULT_BATCH_SIZE)
            .unwrap_or_else(|e| {
                problems.push(e);
                DEFAULT_BATCH_SIZE
            });
        let batch_interval = parse_number("NGINX2SFX_BATCH_INTERVAL", DEFAULT_BATCH_INTERVAL)
            .unwrap_or_else(|e| {
                problems.push(e);
                DEFAULT_BATCH_INTERVAL
            });

        let sfx_token = resolve_token(
            env::var("NGINX2SFX_TOKEN").ok().as_deref(),
            env::var("VCAP_SERVICES").ok().as_deref(),
        );
        let sfx_token = match sfx_token {
            Ok(token) => Some(token),
            Err(e) => {
                problems.push(e);
                None
            }
        };

        for problem in &problems {
            error!("{problem}");
        }
        if let Some(problem) = problems.into_iter().next() {
            return Err(problem);
        }
        let Some(sfx_token) = sfx_token else {
            return Err(ConfigError::MissingToken);
        };

        let config = Config {
            input_file: PathBuf::from(input_file),
            sfx_url,
            sfx_token,
            batch_size,
            batch_interval: Duration::from_secs(batch_interval),
            uri_as_dimension: flag("NGINX2SFX_URI_AS_DIMENSION"),
            skip_ssl_validation: flag("NGINX2SFX_SKIP_SSL_VALIDATION"),
            delivery_timeout: DELIVERY_TIMEOUT,
            metadata: DeploymentMetadata::from_env(),
        };
        debug!("using configuration: {config:?}");
        Ok(config)
    }
}

/// Whether `NGINX2SFX_DEBUG` asks for debug logging. Any value other than
/// empty or `false` enables it. Read before the subscriber is installed, so
/// it is not part of [`Config`].
#[must_use]
pub fn debug_enabled() -> bool {
    env::var("NGINX2SFX_DEBUG")
        .map(|val| !val.is_empty() && val != "false")
        .unwrap_or(false)
}

fn flag(var: &str) -> bool {
    env::var(var).map(|val| val == "true").unwrap_or(false)
}

fn parse_number<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = std::num::ParseIntError>,
{
    match env::var(var) {
        Ok(value) if !value.is_empty() => {
            value
                .trim()
                .parse::<T>()
                .map_err(|source| ConfigError::InvalidNumber { var, value, source })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serial_test::serial;
    use std::env;
    use std::time::Duration;

    use crate::config;
    use crate::errors::ConfigError;

    const VARS: [&str; 12] = [
        "NGINX2SFX_DEBUG",
        "NGINX2SFX_INPUTFILE",
        "NGINX2SFX_URL",
        "NGINX2SFX_TOKEN",
        "NGINX2SFX_BATCH_SIZE",
        "NGINX2SFX_BATCH_INTERVAL",
        "NGINX2SFX_URI_AS_DIMENSION",
        "NGINX2SFX_SKIP_SSL_VALIDATION",
        "VCAP_APPLICATION",
        "VCAP_SERVICES",
        "RABOPCF_SYSTEM_ENV",
        "CF_INSTANCE_INDEX",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_required() {
        env::set_var("NGINX2SFX_URL", "https://ingest.example.com/v2/datapoint");
        env::set_var("NGINX2SFX_TOKEN", "_not_a_real_token_");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        set_required();
        let config = config::Config::new().unwrap();
        assert_eq!(config.input_file.to_str(), Some("logs/nginx2sfx.log"));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_interval, Duration::from_secs(5));
        assert_eq!(config.delivery_timeout, Duration::from_secs(3));
        assert!(!config.uri_as_dimension);
        assert!(!config.skip_ssl_validation);
        assert!(!config::debug_enabled());
        assert_eq!(config.metadata, config::DeploymentMetadata::default());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_if_no_url() {
        clear_env();
        env::set_var("NGINX2SFX_TOKEN", "_not_a_real_token_");
        let config = config::Config::new();
        assert_eq!(
            config.unwrap_err().to_string(),
            "missing environment variable: NGINX2SFX_URL"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_if_no_token() {
        clear_env();
        env::set_var("NGINX2SFX_URL", "https://ingest.example.com");
        assert!(matches!(
            config::Config::new(),
            Err(ConfigError::MissingToken)
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_if_batch_size_not_a_number() {
        clear_env();
        set_required();
        env::set_var("NGINX2SFX_BATCH_SIZE", "lots");
        assert!(matches!(
            config::Config::new(),
            Err(ConfigError::InvalidNumber {
                var: "NGINX2SFX_BATCH_SIZE",
                ..
            })
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear_env();
        set_required();
        env::set_var("NGINX2SFX_INPUTFILE", "/tmp/access.json.log");
        env::set_var("NGINX2SFX_BATCH_SIZE", "250");
        env::set_var("NGINX2SFX_BATCH_INTERVAL", "30");
        env::set_var("NGINX2SFX_URI_AS_DIMENSION", "true");
        env::set_var("NGINX2SFX_SKIP_SSL_VALIDATION", "true");
        env::set_var("NGINX2SFX_DEBUG", "yes");
        let config = config::Config::new().unwrap();
        assert_eq!(config.input_file.to_str(), Some("/tmp/access.json.log"));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.batch_interval, Duration::from_secs(30));
        assert!(config.uri_as_dimension);
        assert!(config.skip_ssl_validation);
        assert!(config::debug_enabled());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_enabled_values() {
        clear_env();
        assert!(!config::debug_enabled());
        env::set_var("NGINX2SFX_DEBUG", "");
        assert!(!config::debug_enabled());
        env::set_var("NGINX2SFX_DEBUG", "false");
        assert!(!config::debug_enabled());
        env::set_var("NGINX2SFX_DEBUG", "1");
        assert!(config::debug_enabled());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_flags_only_accept_true() {
        clear_env();
        set_required();
        env::set_var("NGINX2SFX_URI_AS_DIMENSION", "yes");
        env::set_var("NGINX2SFX_DEBUG", "false");
        let config = config::Config::new().unwrap();
        assert!(!config.uri_as_dimension);
        assert!(!config::debug_enabled());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_deployment_metadata_from_vcap_application() {
        clear_env();
        set_required();
        env::set_var(
            "VCAP_APPLICATION",
            r#"{"application_id":"abc-123","name":"shop","space_name":"prod","organization_name":"retail","limits":{"mem":1024}}"#,
        );
        env::set_var("RABOPCF_SYSTEM_ENV", "p02");
        env::set_var("CF_INSTANCE_INDEX", "3");
        let config = config::Config::new().unwrap();
        assert_eq!(
            config.metadata,
            config::DeploymentMetadata {
                environment: "p02".to_string(),
                instance_index: "3".to_string(),
                app_name: "shop".to_string(),
                app_id: "abc-123".to_string(),
                space_name: "prod".to_string(),
                org_name: "retail".to_string(),
            }
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_environment_ignored_outside_cloud_foundry() {
        clear_env();
        set_required();
        env::set_var("RABOPCF_SYSTEM_ENV", "p02");
        env::set_var("CF_INSTANCE_INDEX", "3");
        let config = config::Config::new().unwrap();
        assert_eq!(config.metadata.environment, "");
        assert_eq!(config.metadata.instance_index, "");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_token_from_credhub() {
        clear_env();
        env::set_var("NGINX2SFX_URL", "https://ingest.example.com");
        env::set_var(
            "VCAP_SERVICES",
            r#"{"credhub":[{"instance_name":"sfxtoken","credentials":{"token":"bound"}}]}"#,
        );
        let config = config::Config::new().unwrap();
        assert_eq!(config.sfx_token.expose(), "bound");
        clear_env();
    }
}
