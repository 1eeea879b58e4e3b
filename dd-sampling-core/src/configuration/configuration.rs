// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::{borrow::Cow, fmt::Display, str::FromStr, time::Duration};

use super::sources::CompositeSource;
use super::supported_configurations::SupportedConfigurations;
use crate::constants::{
    DEFAULT_INITIAL_SAMPLE_RATE, DEFAULT_MAX_OPERATIONS, DEFAULT_SAMPLING_REFRESH_INTERVAL,
    DEFAULT_SAMPLING_SERVER_URL, DEFAULT_SERVICE_NAME, MAX_SAMPLING_REFRESH_INTERVAL,
};
use crate::log::LevelFilter;

#[derive(Debug, Clone)]
#[non_exhaustive]
/// Configuration of the remotely controlled sampler
///
/// # Usage
/// ```
/// use dd_sampling_core::Config;
/// use std::time::Duration;
///
/// // This pulls configuration from the environment
/// let mut builder = Config::builder();
///
/// // Manual overrides
/// builder
///     .set_service("my-service".to_string())
///     .set_sampling_refresh_interval(Duration::from_secs(30));
///
/// // Finalize the configuration
/// let config = builder.build();
/// assert_eq!(config.sampling_refresh_interval(), Duration::from_secs(30));
/// ```
pub struct Config {
    // # Service tagging
    service: String,

    // # Sampling
    /// url of the endpoint serving sampling strategies
    sampling_server_url: Cow<'static, str>,
    /// Delay between two strategy fetches
    sampling_refresh_interval: Duration,
    /// Maximum number of operations a per-operation sampler keeps track of
    sampling_max_operations: usize,
    /// Probability used by the sampler until a strategy is retrieved
    initial_sample_rate: f64,

    /// The log level for the library
    log_level: LevelFilter,
}

impl Config {
    fn from_sources(sources: &CompositeSource) -> Self {
        let default = Config::default();

        /// Parsed value of `key`, invalid values are logged and skipped
        fn read<T>(sources: &CompositeSource, key: SupportedConfigurations) -> Option<T>
        where
            T: FromStr,
            T::Err: Display,
        {
            let lookup = sources.lookup(key);
            for invalid in &lookup.invalid {
                crate::dd_warn!(
                    "Config: ignoring invalid value {:?} for {} from {}: {}",
                    invalid.value,
                    key.as_str(),
                    invalid.source,
                    invalid.reason
                );
            }
            lookup.value
        }

        Self {
            service: read(sources, SupportedConfigurations::DD_SERVICE)
                .unwrap_or(default.service),
            sampling_server_url: read::<String>(
                sources,
                SupportedConfigurations::DD_TRACE_SAMPLING_SERVER_URL,
            )
            .filter(|url| !url.is_empty())
            .map(Cow::Owned)
            .unwrap_or(default.sampling_server_url),
            sampling_refresh_interval: read::<f64>(
                sources,
                SupportedConfigurations::DD_TRACE_SAMPLING_REFRESH_INTERVAL,
            )
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|interval| !interval.is_zero())
            .map(|interval| interval.min(MAX_SAMPLING_REFRESH_INTERVAL))
            .unwrap_or(default.sampling_refresh_interval),
            sampling_max_operations: read::<usize>(
                sources,
                SupportedConfigurations::DD_TRACE_SAMPLING_MAX_OPERATIONS,
            )
            .filter(|max| *max > 0)
            .unwrap_or(default.sampling_max_operations),
            initial_sample_rate: read::<f64>(sources, SupportedConfigurations::DD_TRACE_SAMPLE_RATE)
                .filter(|rate| rate.is_finite())
                .unwrap_or(default.initial_sample_rate),
            log_level: read(sources, SupportedConfigurations::DD_LOG_LEVEL)
                .unwrap_or(default.log_level),
        }
    }

    fn builder_with_sources(sources: &CompositeSource) -> ConfigBuilder {
        ConfigBuilder {
            config: Config::from_sources(sources),
        }
    }

    /// Creates a new builder to set overrides detected configuration
    pub fn builder() -> ConfigBuilder {
        Self::builder_with_sources(&CompositeSource::from_env())
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn sampling_server_url(&self) -> &str {
        &self.sampling_server_url
    }

    pub fn sampling_refresh_interval(&self) -> Duration {
        self.sampling_refresh_interval
    }

    pub fn sampling_max_operations(&self) -> usize {
        self.sampling_max_operations
    }

    pub fn initial_sample_rate(&self) -> f64 {
        self.initial_sample_rate
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service: DEFAULT_SERVICE_NAME.to_string(),
            sampling_server_url: Cow::Borrowed(DEFAULT_SAMPLING_SERVER_URL),
            sampling_refresh_interval: DEFAULT_SAMPLING_REFRESH_INTERVAL,
            sampling_max_operations: DEFAULT_MAX_OPERATIONS,
            initial_sample_rate: DEFAULT_INITIAL_SAMPLE_RATE,
            log_level: LevelFilter::default(),
        }
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Finalizes the builder and returns the configuration
    pub fn build(self) -> Config {
        self.config
    }

    pub fn set_service(&mut self, service: String) -> &mut Self {
        self.config.service = service;
        self
    }

    pub fn set_sampling_server_url(&mut self, url: Cow<'static, str>) -> &mut Self {
        self.config.sampling_server_url = url;
        self
    }

    /// A zero interval is ignored, intervals longer than a year are capped to one year
    pub fn set_sampling_refresh_interval(&mut self, interval: Duration) -> &mut Self {
        if !interval.is_zero() {
            self.config.sampling_refresh_interval = interval.min(MAX_SAMPLING_REFRESH_INTERVAL);
        }
        self
    }

    /// A zero cap is ignored
    pub fn set_sampling_max_operations(&mut self, max_operations: usize) -> &mut Self {
        if max_operations > 0 {
            self.config.sampling_max_operations = max_operations;
        }
        self
    }

    pub fn set_initial_sample_rate(&mut self, rate: f64) -> &mut Self {
        self.config.initial_sample_rate = rate;
        self
    }

    pub fn set_log_level(&mut self, log_level: LevelFilter) -> &mut Self {
        self.config.log_level = log_level;
        self
    }
}
