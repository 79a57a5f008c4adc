#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! # Postagg Settings
//!
//! Configuration is specified in several ways, with later methods overriding earlier ones.
//!
//! 1. A base configuration checked into the repository, in `config/base.yaml`.
//!    This provides the default values for most settings.
//! 2. Per-environment configuration files in the `config` directory. The
//!    environment is selected using the environment variable `POSTAGG_ENV`. The
//!    settings for that environment are then loaded from `config/${env}.yaml`, if
//!    it exists. The default environment is "development". A "production"
//!    environment is also provided.
//! 3. A local configuration file not checked into the repository, at
//!    `config/local.yaml`. This file is in `.gitignore` and is safe to use for
//!    local configuration and secrets if desired.
//! 4. Environment variables that begin with `POSTAGG_` and have a separator for
//!    `__`. For example, `Settings::http::workers` can be controlled from the
//!    environment variable `POSTAGG_HTTP__WORKERS`.
//!
//! Tests should use `Settings::load_for_tests` which only reads from
//! `config/base.yaml`, `config/test.yaml`, and `config/local_test.yaml` (if it
//! exists). It does not read from environment variables.
//!
//! Configuration files are canonically YAML files.

mod logging;

pub use logging::{LogFormat, LoggingSettings};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::{net::SocketAddr, time::Duration};

/// The directory holding the configuration files, as seen from this crate.
/// Used by tests, which run with the working directory set to the crate under
/// test rather than the workspace root.
const TEST_CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");

/// Top level settings object for Postagg.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[doc(inline)]
pub struct Settings {
    /// The environment Postagg is running in. Should only be set with the
    /// `POSTAGG_ENV` environment variable.
    pub env: String,

    /// Enable additional features to debug the application. This should not be
    /// set to true in production environments.
    pub debug: bool,

    /// Settings for the HTTP server.
    pub http: HttpSettings,

    /// Settings for the upstream blog post API.
    pub upstream: UpstreamSettings,

    /// Settings for the in-memory cache of upstream responses.
    pub memory_cache: MemoryCacheSettings,

    /// Logging settings.
    pub logging: LoggingSettings,

    /// Metrics settings.
    pub metrics: MetricsSettings,

    /// Settings for the `/api/tests` self-test endpoint.
    #[serde(default)]
    pub selftest: SelfTestSettings,
}

/// Settings for the HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpSettings {
    /// The host and port to listen on, such as "127.0.0.1:8080" or "0.0.0.0:80".
    pub listen: SocketAddr,

    /// The number of workers to use. Optional. If no value is provided, the
    /// number of logical cores will be used.
    pub workers: Option<usize>,
}

/// Settings for the upstream search-by-tag API.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// The endpoint to query. A `tag` query parameter is appended per request,
    /// for example `https://api.hatchways.io/assessment/blog/posts`.
    pub base_url: String,

    /// The maximum time an upstream request, including reading the body, may take.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,

    /// The maximum time to wait while establishing a connection to the upstream.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub connect_timeout: Duration,

    /// The User-Agent header sent with upstream requests.
    pub user_agent: String,

    /// The most tags of one request fetched from the upstream at the same time.
    pub max_concurrent_fetches: usize,
}

/// Settings for the in-memory upstream response cache.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryCacheSettings {
    /// Whether upstream responses are cached at all.
    pub enabled: bool,

    /// How long a cached response stays valid. If unset, entries never expire.
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub default_ttl: Option<Duration>,

    /// The maximum number of upstream responses to hold. If unset, the cache
    /// is unbounded.
    pub max_entries: Option<usize>,
}

/// Settings for the statsd metrics client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// The host to send metrics to.
    pub sink_host: String,

    /// The port to send metrics to.
    pub sink_port: u16,

    /// The maximum size, in kilobytes, of the metrics queue before new
    /// metrics are dropped.
    pub max_queue_size_kb: usize,
}

/// Settings for the self-test endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SelfTestSettings {
    /// The base URL the self-test sends its requests to, such as
    /// `http://127.0.0.1:8000`. If unset, the address of the bound listener is
    /// used.
    pub base_url: Option<String>,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// # Errors
    /// If any of the configured values are invalid, or if any of the required
    /// configuration files are missing.
    pub fn load() -> Result<Self, ConfigError> {
        let postagg_env =
            std::env::var("POSTAGG_ENV").unwrap_or_else(|_| "development".to_string());

        let s = Config::builder()
            // Start off with the base config.
            .add_source(File::with_name("./config/base"))
            // Merge in an environment specific config.
            .set_override("env", postagg_env.as_str())?
            .add_source(File::with_name(&format!("config/{}", postagg_env)).required(false))
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables that start with "POSTAGG_" and have "__" to
            // separate levels. For example, `POSTAGG_HTTP__LISTEN` maps to
            // `Settings::http::listen`.
            .add_source(
                Environment::with_prefix("POSTAGG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Load settings from configuration files for tests.
    ///
    /// `changer` is applied to the loaded settings before they are returned,
    /// so that tests can adjust individual values.
    ///
    /// # Panics
    /// If the test configuration files are missing or invalid.
    pub fn load_for_tests<F: FnOnce(&mut Self)>(changer: F) -> Self {
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/base", TEST_CONFIG_DIR)))
            .set_override("env", "test")
            .expect("Could not set env for tests")
            .add_source(File::with_name(&format!("{}/test", TEST_CONFIG_DIR)))
            .add_source(
                File::with_name(&format!("{}/local_test", TEST_CONFIG_DIR)).required(false),
            )
            .build()
            .expect("Could not load settings for tests");

        let mut settings: Self = s.try_deserialize().expect("Could not convert settings");
        changer(&mut settings);
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_settings_load() {
        let settings = Settings::load_for_tests(|_| ());
        assert_eq!(settings.env, "test");
        assert!(settings.debug);
        assert_eq!(settings.upstream.timeout, Duration::from_secs(10));
        assert_eq!(settings.upstream.max_concurrent_fetches, 8);
        assert_eq!(settings.memory_cache.default_ttl, None);
    }

    #[test]
    fn test_changer_is_applied() {
        let settings = Settings::load_for_tests(|settings| {
            settings.memory_cache.enabled = false;
            settings.upstream.base_url = "http://localhost:1234/posts".to_string();
        });
        assert!(!settings.memory_cache.enabled);
        assert_eq!(settings.upstream.base_url, "http://localhost:1234/posts");
    }

    #[test]
    fn test_durations_deserialize_from_seconds() {
        let settings: super::MemoryCacheSettings = serde_json::from_value(serde_json::json!({
            "enabled": true,
            "default_ttl": 300,
            "max_entries": 16,
        }))
        .expect("valid memory cache settings");
        assert_eq!(settings.default_ttl, Some(Duration::from_secs(300)));
        assert_eq!(settings.max_entries, Some(16));
    }
}
