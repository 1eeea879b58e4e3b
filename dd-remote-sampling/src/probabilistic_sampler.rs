// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::constants::{numeric, rate, tags};
use crate::types::{SamplingResult, Tag, TraceId};
use numeric::{KNUTH_FACTOR, MAX_UINT_64BITS};

/// Keeps (100 * `sample_rate`)% of the traces.
///
/// The decision is a pure function of the trace id, so every process sampling the same
/// trace with the same rate reaches the same decision.
#[derive(Clone)]
pub struct ProbabilisticSampler {
    sample_rate: f64,
    sampling_id_threshold: u64,
    tags: [Tag; 2],
}

impl fmt::Debug for ProbabilisticSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbabilisticSampler")
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

impl ProbabilisticSampler {
    // Helper method to calculate the threshold from a rate
    fn calculate_threshold(rate: f64) -> u64 {
        if rate >= rate::MAX_SAMPLE_RATE {
            MAX_UINT_64BITS
        } else {
            (rate * (MAX_UINT_64BITS as f64)) as u64
        }
    }

    /// `sample_rate` is clamped between 0.0 and 1.0 inclusive, NaN is treated as 0.0.
    pub fn new(sample_rate: f64) -> Self {
        let clamped_rate = if sample_rate.is_nan() {
            rate::MIN_SAMPLE_RATE
        } else {
            sample_rate.clamp(rate::MIN_SAMPLE_RATE, rate::MAX_SAMPLE_RATE)
        };

        ProbabilisticSampler {
            sample_rate: clamped_rate,
            sampling_id_threshold: Self::calculate_threshold(clamped_rate),
            tags: [
                Tag::new_static(tags::SAMPLER_TYPE, tags::SAMPLER_TYPE_PROBABILISTIC),
                Tag::new_f64(tags::SAMPLER_PARAM, clamped_rate),
            ],
        }
    }

    /// Returns the current sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub(crate) fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Decision without tags, used by composite samplers
    pub(crate) fn is_sampled(&self, trace_id: TraceId) -> bool {
        // Fast-path for sample rate of 0.0 (always drop) or 1.0 (always sample)
        if self.sample_rate <= rate::MIN_SAMPLE_RATE {
            return false;
        }
        if self.sample_rate >= rate::MAX_SAMPLE_RATE {
            return true;
        }

        let hashed_id = trace_id.lower_64_bits().wrapping_mul(KNUTH_FACTOR);

        // If the hashed ID is less than the threshold, sample the trace
        hashed_id <= self.sampling_id_threshold
    }

    pub fn decide(&self, trace_id: TraceId, _operation: &str) -> SamplingResult {
        SamplingResult::new(self.is_sampled(trace_id), &self.tags)
    }

    pub fn equivalent_to(&self, other: &ProbabilisticSampler) -> bool {
        self.sample_rate == other.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagValue;

    fn trace_id_with_low_bits(low: u64) -> TraceId {
        let mut bytes = [0u8; 16];
        bytes[8..16].copy_from_slice(&low.to_be_bytes());
        TraceId::from_bytes(bytes)
    }

    #[test]
    fn check_debug_impl() {
        let sampler = ProbabilisticSampler::new(0.5);
        let debug_output = format!("{:?}", sampler);
        assert!(debug_output.contains("ProbabilisticSampler"));
        assert!(debug_output.contains("sample_rate: 0.5"));
    }

    #[test]
    fn test_probabilistic_sampler_new() {
        // Standard rates
        let sampler_zero = ProbabilisticSampler::new(0.0);
        assert_eq!(sampler_zero.sample_rate, 0.0);
        assert_eq!(sampler_zero.sampling_id_threshold, 0);

        let sampler_quarter = ProbabilisticSampler::new(0.25);
        assert_eq!(sampler_quarter.sample_rate, 0.25);
        assert_eq!(
            sampler_quarter.sampling_id_threshold,
            (0.25 * (MAX_UINT_64BITS as f64)) as u64
        );

        let sampler_one = ProbabilisticSampler::new(1.0);
        assert_eq!(sampler_one.sample_rate, 1.0);
        assert_eq!(sampler_one.sampling_id_threshold, MAX_UINT_64BITS);

        // Boundary handling
        assert_eq!(ProbabilisticSampler::new(-0.1).sample_rate(), 0.0);
        assert_eq!(ProbabilisticSampler::new(1.1).sample_rate(), 1.0);
        assert_eq!(ProbabilisticSampler::new(f64::NAN).sample_rate(), 0.0);
    }

    #[test]
    fn test_probabilistic_sampler_tags() {
        let result = ProbabilisticSampler::new(0.25).decide(TraceId::from_u128(0), "op");
        assert_eq!(
            result.tag(tags::SAMPLER_TYPE),
            Some(&TagValue::String("probabilistic".into()))
        );
        assert_eq!(result.tag(tags::SAMPLER_PARAM), Some(&TagValue::F64(0.25)));
    }

    #[test]
    fn test_probabilistic_sampler_decide() {
        // Sample Rate 0.0: Should always drop
        let sampler_zero = ProbabilisticSampler::new(0.0);
        // Sample Rate 1.0: Should always sample
        let sampler_one = ProbabilisticSampler::new(1.0);
        for i in [0u64, 1, 42, u64::MAX] {
            let trace_id = trace_id_with_low_bits(i);
            assert!(!sampler_zero.decide(trace_id, "").sampled);
            assert!(sampler_one.decide(trace_id, "").sampled);
        }

        // Sample Rate 0.5: Create deterministic test cases
        let sampler_half = ProbabilisticSampler::new(0.5);
        let threshold = sampler_half.sampling_id_threshold;

        // A trace ID of all zeros hashes to 0, guaranteed below threshold
        let trace_id_sample = TraceId::from_bytes([0u8; 16]);

        // Setting multiple bits to ensure it hashes above the threshold
        let mut bytes_drop = [0u8; 16];
        bytes_drop[8] = 0xFF;
        bytes_drop[9] = 0xFF;
        let trace_id_drop = TraceId::from_bytes(bytes_drop);

        let sample_hash = trace_id_sample.lower_64_bits().wrapping_mul(KNUTH_FACTOR);
        let drop_hash = trace_id_drop.lower_64_bits().wrapping_mul(KNUTH_FACTOR);
        assert!(
            sample_hash <= threshold,
            "Sample hash {} should be <= threshold {}",
            sample_hash,
            threshold
        );
        assert!(
            drop_hash > threshold,
            "Drop hash {} should be > threshold {}",
            drop_hash,
            threshold
        );

        assert!(sampler_half.decide(trace_id_sample, "").sampled);
        assert!(!sampler_half.decide(trace_id_drop, "").sampled);
    }

    #[test]
    fn test_only_lower_bits_matter() {
        let sampler = ProbabilisticSampler::new(0.5);
        for low in 0..64u64 {
            let short = trace_id_with_low_bits(low);
            let long = TraceId::from_u128(((0xdead_beef_u128) << 64) | low as u128);
            assert_eq!(
                sampler.decide(short, "a").sampled,
                sampler.decide(long, "b").sampled
            );
        }
    }

    #[test]
    fn test_sampled_fraction_follows_rate() {
        let sampler = ProbabilisticSampler::new(0.25);
        let sampled = (0..10_000u64)
            .filter(|i| sampler.is_sampled(TraceId::from(i.wrapping_mul(0x9E37_79B9_7F4A_7C15))))
            .count();
        assert!(
            (2_000..3_000).contains(&sampled),
            "expected roughly 2500 sampled traces, got {sampled}"
        );
    }

    #[test]
    fn test_equivalence() {
        let sampler = ProbabilisticSampler::new(0.5);
        assert!(sampler.equivalent_to(&ProbabilisticSampler::new(0.5)));
        assert!(!sampler.equivalent_to(&ProbabilisticSampler::new(0.25)));
        // clamped rates compare equal
        assert!(ProbabilisticSampler::new(2.0).equivalent_to(&ProbabilisticSampler::new(1.0)));
    }
}
