// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::adaptive_sampler::AdaptiveSampler;
use crate::probabilistic_sampler::ProbabilisticSampler;
use crate::rate_limiting_sampler::RateLimitingSampler;
use crate::types::{SamplingResult, TraceId};

/// The sampler driven by the remote sampling server.
///
/// Resources held by a variant are released when it is dropped, which happens when the
/// remote sampler replaces it.
#[derive(Debug)]
pub enum Sampler {
    Probabilistic(ProbabilisticSampler),
    RateLimiting(RateLimitingSampler),
    Adaptive(AdaptiveSampler),
}

impl Sampler {
    pub fn decide(&self, trace_id: TraceId, operation: &str) -> SamplingResult {
        match self {
            Sampler::Probabilistic(sampler) => sampler.decide(trace_id, operation),
            Sampler::RateLimiting(sampler) => sampler.decide(trace_id, operation),
            Sampler::Adaptive(sampler) => sampler.decide(trace_id, operation),
        }
    }

    /// Two samplers are equivalent when they are the same kind with the same parameters
    pub fn equivalent_to(&self, other: &Sampler) -> bool {
        match (self, other) {
            (Sampler::Probabilistic(a), Sampler::Probabilistic(b)) => a.equivalent_to(b),
            (Sampler::RateLimiting(a), Sampler::RateLimiting(b)) => a.equivalent_to(b),
            (Sampler::Adaptive(a), Sampler::Adaptive(b)) => a.equivalent_to(b),
            _ => false,
        }
    }

    pub fn as_adaptive(&self) -> Option<&AdaptiveSampler> {
        match self {
            Sampler::Adaptive(sampler) => Some(sampler),
            _ => None,
        }
    }

    pub fn as_adaptive_mut(&mut self) -> Option<&mut AdaptiveSampler> {
        match self {
            Sampler::Adaptive(sampler) => Some(sampler),
            _ => None,
        }
    }
}

impl From<ProbabilisticSampler> for Sampler {
    fn from(sampler: ProbabilisticSampler) -> Self {
        Sampler::Probabilistic(sampler)
    }
}

impl From<RateLimitingSampler> for Sampler {
    fn from(sampler: RateLimitingSampler) -> Self {
        Sampler::RateLimiting(sampler)
    }
}

impl From<AdaptiveSampler> for Sampler {
    fn from(sampler: AdaptiveSampler) -> Self {
        Sampler::Adaptive(sampler)
    }
}
