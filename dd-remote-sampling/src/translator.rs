// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Maps a sampling strategy response to the change it requires on the active sampler

use crate::adaptive_sampler::AdaptiveSampler;
use crate::error::Error;
use crate::probabilistic_sampler::ProbabilisticSampler;
use crate::rate_limiting_sampler::RateLimitingSampler;
use crate::sampler::Sampler;
use crate::strategy::{PerOperationSamplingStrategies, SamplingStrategyResponse};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerUpdate<'a> {
    /// Merge into the active adaptive sampler, or install a new one
    Adaptive(&'a PerOperationSamplingStrategies),
    Probabilistic { sampling_rate: f64 },
    RateLimiting { max_traces_per_second: f64 },
}

/// Per-operation strategies take precedence over a single strategy carried by the same
/// response, then probabilistic over rate limiting.
pub fn translate(response: &SamplingStrategyResponse) -> Result<SamplerUpdate<'_>, Error> {
    if let Some(strategies) = &response.operation_sampling {
        return Ok(SamplerUpdate::Adaptive(strategies));
    }
    if let Some(probabilistic) = &response.probabilistic_sampling {
        return Ok(SamplerUpdate::Probabilistic {
            sampling_rate: probabilistic.sampling_rate,
        });
    }
    if let Some(rate_limiting) = &response.rate_limiting_sampling {
        return Ok(SamplerUpdate::RateLimiting {
            max_traces_per_second: rate_limiting.max_traces_per_second,
        });
    }
    Err(Error::UnsupportedStrategy(response.strategy_type))
}

impl SamplerUpdate<'_> {
    /// Builds a new sampler applying this update
    pub fn build(&self, max_operations: usize) -> Sampler {
        match *self {
            SamplerUpdate::Adaptive(strategies) => {
                AdaptiveSampler::new(strategies, max_operations).into()
            }
            SamplerUpdate::Probabilistic { sampling_rate } => {
                ProbabilisticSampler::new(sampling_rate).into()
            }
            SamplerUpdate::RateLimiting {
                max_traces_per_second,
            } => RateLimitingSampler::new(max_traces_per_second).into(),
        }
    }
}
