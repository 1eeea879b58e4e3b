// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Instant;

use crate::constants::tags;
use crate::rate_limiter::RateLimiter;
use crate::types::{SamplingResult, Tag, TraceId};

/// Samples at most `max_traces_per_second` traces per second.
///
/// Bursts of up to `max(max_traces_per_second, 1)` traces are allowed, so a rate below one
/// trace per second still lets a trace through from time to time.
pub struct RateLimitingSampler {
    max_traces_per_second: f64,
    rate_limiter: RateLimiter,
    tags: [Tag; 2],
}

impl fmt::Debug for RateLimitingSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitingSampler")
            .field("max_traces_per_second", &self.max_traces_per_second)
            .finish()
    }
}

impl RateLimitingSampler {
    pub fn new(max_traces_per_second: f64) -> Self {
        Self::new_at(max_traces_per_second, Instant::now())
    }

    pub(crate) fn new_at(max_traces_per_second: f64, now: Instant) -> Self {
        let max_traces_per_second = if max_traces_per_second.is_nan() {
            0.0
        } else {
            max_traces_per_second.max(0.0)
        };
        RateLimitingSampler {
            max_traces_per_second,
            rate_limiter: RateLimiter::new_at(
                max_traces_per_second,
                max_traces_per_second.max(1.0),
                now,
            ),
            tags: [
                Tag::new_static(tags::SAMPLER_TYPE, tags::SAMPLER_TYPE_RATE_LIMITING),
                Tag::new_f64(tags::SAMPLER_PARAM, max_traces_per_second),
            ],
        }
    }

    pub fn max_traces_per_second(&self) -> f64 {
        self.max_traces_per_second
    }

    pub fn decide(&self, _trace_id: TraceId, _operation: &str) -> SamplingResult {
        SamplingResult::new(self.rate_limiter.check_credit(1.0), &self.tags)
    }

    #[cfg(test)]
    pub(crate) fn decide_at(&self, now: Instant) -> bool {
        self.rate_limiter.check_credit_at(1.0, now)
    }

    pub fn equivalent_to(&self, other: &RateLimitingSampler) -> bool {
        self.max_traces_per_second == other.max_traces_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagValue;
    use std::time::Duration;

    #[test]
    fn test_rate_limiting_sampler() {
        let start = Instant::now();
        let sampler = RateLimitingSampler::new_at(2.0, start);

        assert!(sampler.decide_at(start));
        assert!(sampler.decide_at(start));
        assert!(!sampler.decide_at(start));

        assert!(sampler.decide_at(start + Duration::from_millis(500)));
        assert!(!sampler.decide_at(start + Duration::from_millis(500)));
    }

    #[test]
    fn test_rate_limiting_sampler_below_one_per_second() {
        let start = Instant::now();
        let sampler = RateLimitingSampler::new_at(0.1, start);

        assert!(sampler.decide_at(start));
        assert!(!sampler.decide_at(start + Duration::from_secs(1)));
        assert!(sampler.decide_at(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_rate_limiting_sampler_tags() {
        let sampler = RateLimitingSampler::new(10.0);
        let result = sampler.decide(TraceId::from_u128(1), "op");
        assert!(result.sampled);
        assert_eq!(
            result.tag(tags::SAMPLER_TYPE),
            Some(&TagValue::String("ratelimiting".into()))
        );
        assert_eq!(result.tag(tags::SAMPLER_PARAM), Some(&TagValue::F64(10.0)));
    }

    #[test]
    fn test_equivalence() {
        let sampler = RateLimitingSampler::new(10.0);
        assert!(sampler.equivalent_to(&RateLimitingSampler::new(10.0)));
        assert!(!sampler.equivalent_to(&RateLimitingSampler::new(5.0)));
    }
}
