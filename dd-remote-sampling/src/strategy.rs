// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sampling strategies as served by a sampling server.
//!
//! The JSON encoding uses camelCase keys. A response carries either a per-operation
//! strategy set or a single strategy (probabilistic or rate limiting).
//!
//! ```
//! use dd_remote_sampling::strategy::SamplingStrategyResponse;
//!
//! let response: SamplingStrategyResponse = serde_json::from_str(
//!     r#"{"strategyType": "PROBABILISTIC", "probabilisticSampling": {"samplingRate": 0.5}}"#,
//! )
//! .unwrap();
//! assert_eq!(response.probabilistic_sampling.unwrap().sampling_rate, 0.5);
//! ```

use std::fmt;

use serde::de::{Error, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Legacy discriminant of a single strategy response.
///
/// Older servers encode it as an integer, newer ones as a string. It is informational only:
/// the populated payload decides which sampler gets built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingStrategyType {
    Probabilistic,
    RateLimiting,
}

impl SamplingStrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingStrategyType::Probabilistic => "PROBABILISTIC",
            SamplingStrategyType::RateLimiting => "RATE_LIMITING",
        }
    }
}

impl fmt::Display for SamplingStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SamplingStrategyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SamplingStrategyType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'vde> serde::de::Visitor<'vde> for Visitor {
            type Value = SamplingStrategyType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("\"PROBABILISTIC\", \"RATE_LIMITING\", 0 or 1")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                match value {
                    "PROBABILISTIC" => Ok(SamplingStrategyType::Probabilistic),
                    "RATE_LIMITING" => Ok(SamplingStrategyType::RateLimiting),
                    _ => Err(Error::invalid_value(Unexpected::Str(value), &self)),
                }
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: Error,
            {
                match value {
                    0 => Ok(SamplingStrategyType::Probabilistic),
                    1 => Ok(SamplingStrategyType::RateLimiting),
                    _ => Err(Error::invalid_value(Unexpected::Signed(value), &self)),
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: Error,
            {
                match value {
                    0 => Ok(SamplingStrategyType::Probabilistic),
                    1 => Ok(SamplingStrategyType::RateLimiting),
                    _ => Err(Error::invalid_value(Unexpected::Unsigned(value), &self)),
                }
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbabilisticSamplingStrategy {
    pub sampling_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitingSamplingStrategy {
    pub max_traces_per_second: f64,
}

/// Probabilistic strategy of a single operation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSamplingStrategy {
    pub operation: String,
    pub probabilistic_sampling: ProbabilisticSamplingStrategy,
}

/// Per-operation strategy set.
///
/// Operations without their own strategy are sampled with `default_sampling_probability`,
/// and every operation is guaranteed `default_lower_bound_traces_per_second`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerOperationSamplingStrategies {
    #[serde(default)]
    pub default_sampling_probability: f64,
    #[serde(default)]
    pub default_lower_bound_traces_per_second: f64,
    #[serde(default)]
    pub per_operation_strategies: Vec<OperationSamplingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_upper_bound_traces_per_second: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingStrategyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<SamplingStrategyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilistic_sampling: Option<ProbabilisticSamplingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limiting_sampling: Option<RateLimitingSamplingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_sampling: Option<PerOperationSamplingStrategies>,
}

impl SamplingStrategyResponse {
    pub fn probabilistic(sampling_rate: f64) -> Self {
        Self {
            strategy_type: Some(SamplingStrategyType::Probabilistic),
            probabilistic_sampling: Some(ProbabilisticSamplingStrategy { sampling_rate }),
            ..Default::default()
        }
    }

    pub fn rate_limiting(max_traces_per_second: f64) -> Self {
        Self {
            strategy_type: Some(SamplingStrategyType::RateLimiting),
            rate_limiting_sampling: Some(RateLimitingSamplingStrategy {
                max_traces_per_second,
            }),
            ..Default::default()
        }
    }

    pub fn per_operation(strategies: PerOperationSamplingStrategies) -> Self {
        Self {
            operation_sampling: Some(strategies),
            ..Default::default()
        }
    }
}

impl PerOperationSamplingStrategies {
    pub fn new(default_sampling_probability: f64, default_lower_bound_traces_per_second: f64) -> Self {
        Self {
            default_sampling_probability,
            default_lower_bound_traces_per_second,
            ..Default::default()
        }
    }

    /// Adds a probabilistic strategy for `operation`
    pub fn with_operation(mut self, operation: impl Into<String>, sampling_rate: f64) -> Self {
        self.per_operation_strategies.push(OperationSamplingStrategy {
            operation: operation.into(),
            probabilistic_sampling: ProbabilisticSamplingStrategy { sampling_rate },
        });
        self
    }
}
