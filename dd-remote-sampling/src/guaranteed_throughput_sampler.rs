// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Instant;

use crate::constants::tags;
use crate::probabilistic_sampler::ProbabilisticSampler;
use crate::rate_limiter::RateLimiter;
use crate::types::{SamplingResult, Tag, TraceId};

/// Probabilistic sampler with a guaranteed minimal throughput.
///
/// Traces kept by the probabilistic sampler are kept with its tags. Other traces are
/// still kept while the lower bound rate limiter has credits, so an operation with a
/// very low probability keeps reporting at least `lower_bound` traces per second.
pub struct GuaranteedThroughputSampler {
    probabilistic_sampler: ProbabilisticSampler,
    lower_bound: f64,
    lower_bound_limiter: RateLimiter,
    lower_bound_tags: [Tag; 2],
}

impl fmt::Debug for GuaranteedThroughputSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuaranteedThroughputSampler")
            .field("sample_rate", &self.sampling_rate())
            .field("lower_bound", &self.lower_bound)
            .finish()
    }
}

fn lower_bound_tags(sampling_rate: f64) -> [Tag; 2] {
    [
        Tag::new_static(tags::SAMPLER_TYPE, tags::SAMPLER_TYPE_LOWER_BOUND),
        Tag::new_f64(tags::SAMPLER_PARAM, sampling_rate),
    ]
}

fn sanitize_lower_bound(lower_bound: f64) -> f64 {
    if lower_bound.is_nan() {
        0.0
    } else {
        lower_bound.max(0.0)
    }
}

impl GuaranteedThroughputSampler {
    pub fn new(lower_bound: f64, sampling_rate: f64) -> Self {
        Self::new_at(lower_bound, sampling_rate, Instant::now())
    }

    pub(crate) fn new_at(lower_bound: f64, sampling_rate: f64, now: Instant) -> Self {
        let lower_bound = sanitize_lower_bound(lower_bound);
        let probabilistic_sampler = ProbabilisticSampler::new(sampling_rate);
        let lower_bound_tags = lower_bound_tags(probabilistic_sampler.sample_rate());
        GuaranteedThroughputSampler {
            probabilistic_sampler,
            lower_bound,
            lower_bound_limiter: RateLimiter::new_at(lower_bound, lower_bound.max(1.0), now),
            lower_bound_tags,
        }
    }

    pub fn sampling_rate(&self) -> f64 {
        self.probabilistic_sampler.sample_rate()
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn decide(&self, trace_id: TraceId, _operation: &str) -> SamplingResult {
        self.decide_at(trace_id, Instant::now())
    }

    pub(crate) fn decide_at(&self, trace_id: TraceId, now: Instant) -> SamplingResult {
        if self.probabilistic_sampler.is_sampled(trace_id) {
            // Sampled traces count against the lower bound too
            self.lower_bound_limiter.check_credit_at(1.0, now);
            return SamplingResult::new(true, self.probabilistic_sampler.tags());
        }
        let sampled = self.lower_bound_limiter.check_credit_at(1.0, now);
        SamplingResult::new(sampled, &self.lower_bound_tags)
    }

    /// Applies a new strategy while keeping the credits accumulated by the lower bound limiter
    pub fn update(&mut self, lower_bound: f64, sampling_rate: f64) {
        self.update_at(lower_bound, sampling_rate, Instant::now())
    }

    pub(crate) fn update_at(&mut self, lower_bound: f64, sampling_rate: f64, now: Instant) {
        let candidate = ProbabilisticSampler::new(sampling_rate);
        if !self.probabilistic_sampler.equivalent_to(&candidate) {
            self.lower_bound_tags = lower_bound_tags(candidate.sample_rate());
            self.probabilistic_sampler = candidate;
        }
        let lower_bound = sanitize_lower_bound(lower_bound);
        if self.lower_bound != lower_bound {
            self.lower_bound_limiter
                .update_at(lower_bound, lower_bound.max(1.0), now);
            self.lower_bound = lower_bound;
        }
    }

    pub fn equivalent_to(&self, other: &GuaranteedThroughputSampler) -> bool {
        self.lower_bound == other.lower_bound
            && self
                .probabilistic_sampler
                .equivalent_to(&other.probabilistic_sampler)
    }
}
