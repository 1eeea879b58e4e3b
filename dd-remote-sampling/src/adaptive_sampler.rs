// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::{PoisonError, RwLock};

use crate::guaranteed_throughput_sampler::GuaranteedThroughputSampler;
use crate::probabilistic_sampler::ProbabilisticSampler;
use crate::strategy::PerOperationSamplingStrategies;
use crate::types::{SamplingResult, TraceId};

/// Samples every operation with its own [`GuaranteedThroughputSampler`].
///
/// Operations unknown to the sampling server are registered on first use with the default
/// probability and lower bound, until `max_operations` operations are tracked. Past that
/// cap the default probabilistic sampler decides.
pub struct AdaptiveSampler {
    state: RwLock<AdaptiveState>,
    max_operations: usize,
}

struct AdaptiveState {
    samplers: HashMap<String, GuaranteedThroughputSampler>,
    default_sampler: ProbabilisticSampler,
    lower_bound: f64,
}

impl fmt::Debug for AdaptiveSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("AdaptiveSampler")
            .field("default_sampler", &state.default_sampler)
            .field("lower_bound", &state.lower_bound)
            .field("operations", &state.samplers.len())
            .field("max_operations", &self.max_operations)
            .finish()
    }
}

impl AdaptiveSampler {
    pub fn new(strategies: &PerOperationSamplingStrategies, max_operations: usize) -> Self {
        let lower_bound = strategies.default_lower_bound_traces_per_second;
        let samplers = strategies
            .per_operation_strategies
            .iter()
            .map(|strategy| {
                (
                    strategy.operation.clone(),
                    GuaranteedThroughputSampler::new(
                        lower_bound,
                        strategy.probabilistic_sampling.sampling_rate,
                    ),
                )
            })
            .collect();

        AdaptiveSampler {
            state: RwLock::new(AdaptiveState {
                samplers,
                default_sampler: ProbabilisticSampler::new(
                    strategies.default_sampling_probability,
                ),
                lower_bound,
            }),
            max_operations,
        }
    }

    pub fn decide(&self, trace_id: TraceId, operation: &str) -> SamplingResult {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(sampler) = state.samplers.get(operation) {
                return sampler.decide(trace_id, operation);
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have registered the operation in the meantime
        if let Some(sampler) = state.samplers.get(operation) {
            return sampler.decide(trace_id, operation);
        }
        if state.samplers.len() >= self.max_operations {
            return state.default_sampler.decide(trace_id, operation);
        }

        let sampler =
            GuaranteedThroughputSampler::new(state.lower_bound, state.default_sampler.sample_rate());
        let result = sampler.decide(trace_id, operation);
        state.samplers.insert(operation.to_string(), sampler);
        result
    }

    /// Applies a new strategy set in place.
    ///
    /// Operations listed in `strategies` are updated (or added), keeping the credits of their
    /// lower bound limiters. Operations not listed keep their current sampler. The default
    /// sampler is only rebuilt when the default probability changes.
    pub fn merge(&mut self, strategies: &PerOperationSamplingStrategies) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let lower_bound = strategies.default_lower_bound_traces_per_second;

        for strategy in &strategies.per_operation_strategies {
            let sampling_rate = strategy.probabilistic_sampling.sampling_rate;
            match state.samplers.get_mut(&strategy.operation) {
                Some(sampler) => sampler.update(lower_bound, sampling_rate),
                None => {
                    state.samplers.insert(
                        strategy.operation.clone(),
                        GuaranteedThroughputSampler::new(lower_bound, sampling_rate),
                    );
                }
            }
        }

        state.lower_bound = lower_bound;
        let default_sampler = ProbabilisticSampler::new(strategies.default_sampling_probability);
        if !state.default_sampler.equivalent_to(&default_sampler) {
            state.default_sampler = default_sampler;
        }
    }

    pub fn max_operations(&self) -> usize {
        self.max_operations
    }

    pub fn lower_bound(&self) -> f64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lower_bound
    }

    pub fn default_sampling_rate(&self) -> f64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_sampler
            .sample_rate()
    }

    /// Probability of `operation`, if the operation is tracked
    pub fn operation_sampling_rate(&self, operation: &str) -> Option<f64> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samplers
            .get(operation)
            .map(GuaranteedThroughputSampler::sampling_rate)
    }

    /// Names of the tracked operations, sorted
    pub fn operations(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut operations: Vec<String> = state.samplers.keys().cloned().collect();
        operations.sort_unstable();
        operations
    }

    pub fn equivalent_to(&self, other: &AdaptiveSampler) -> bool {
        if ptr::eq(self, other) {
            return true;
        }
        if self.max_operations != other.max_operations {
            return false;
        }
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let other_state = other.state.read().unwrap_or_else(PoisonError::into_inner);

        state.lower_bound == other_state.lower_bound
            && state
                .default_sampler
                .equivalent_to(&other_state.default_sampler)
            && state.samplers.len() == other_state.samplers.len()
            && state.samplers.iter().all(|(operation, sampler)| {
                other_state
                    .samplers
                    .get(operation)
                    .is_some_and(|other| sampler.equivalent_to(other))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::tags;
    use crate::types::TagValue;

    fn strategies() -> PerOperationSamplingStrategies {
        PerOperationSamplingStrategies::new(0.0, 1.0)
            .with_operation("A", 1.0)
            .with_operation("B", 0.0)
    }

    #[test]
    fn test_known_operations_use_their_strategy() {
        let sampler = AdaptiveSampler::new(&strategies(), 10);

        let result = sampler.decide(TraceId::from(1u64), "A");
        assert!(result.sampled);
        assert_eq!(
            result.tag(tags::SAMPLER_TYPE),
            Some(&TagValue::String("probabilistic".into()))
        );
        assert_eq!(result.tag(tags::SAMPLER_PARAM), Some(&TagValue::F64(1.0)));

        // B only goes through its lower bound
        let result = sampler.decide(TraceId::from(1u64), "B");
        assert!(result.sampled);
        assert_eq!(
            result.tag(tags::SAMPLER_TYPE),
            Some(&TagValue::String("lowerbound".into()))
        );
        assert!(!sampler.decide(TraceId::from(2u64), "B").sampled);
    }

    #[test]
    fn test_unknown_operations_are_registered() {
        let sampler = AdaptiveSampler::new(&PerOperationSamplingStrategies::new(0.0, 1.0), 10);
        assert!(sampler.operations().is_empty());

        // New operations get the default lower bound
        assert!(sampler.decide(TraceId::from(1u64), "new-op").sampled);
        assert!(!sampler.decide(TraceId::from(2u64), "new-op").sampled);
        assert_eq!(sampler.operations(), vec!["new-op".to_string()]);
        assert_eq!(sampler.operation_sampling_rate("new-op"), Some(0.0));
    }

    #[test]
    fn test_max_operations() {
        let sampler = AdaptiveSampler::new(&PerOperationSamplingStrategies::new(0.0, 1.0), 2);
        sampler.decide(TraceId::from(1u64), "first");
        sampler.decide(TraceId::from(1u64), "second");

        // Past the cap the default sampler decides and nothing is registered
        let result = sampler.decide(TraceId::from(1u64), "third");
        assert!(!result.sampled);
        assert_eq!(
            result.tag(tags::SAMPLER_TYPE),
            Some(&TagValue::String("probabilistic".into()))
        );
        assert_eq!(
            sampler.operations(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_merge_keeps_unmentioned_operations() {
        let mut sampler = AdaptiveSampler::new(&strategies(), 10);

        sampler.merge(&PerOperationSamplingStrategies::new(0.5, 2.0).with_operation("A", 0.25));

        assert_eq!(sampler.operation_sampling_rate("A"), Some(0.25));
        assert_eq!(sampler.operation_sampling_rate("B"), Some(0.0));
        assert_eq!(sampler.lower_bound(), 2.0);
        assert_eq!(sampler.default_sampling_rate(), 0.5);
    }

    #[test]
    fn test_merge_adds_operations_past_the_cap() {
        let mut sampler = AdaptiveSampler::new(&strategies(), 2);
        sampler.merge(&strategies().with_operation("C", 0.5));
        assert_eq!(sampler.operations(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_merge_keeps_lower_bound_credits() {
        let mut sampler = AdaptiveSampler::new(&strategies(), 10);
        assert!(sampler.decide(TraceId::from(1u64), "B").sampled);

        // Same strategy again, B already used its credit for this second
        sampler.merge(&strategies());
        assert!(!sampler.decide(TraceId::from(2u64), "B").sampled);
    }

    #[test]
    fn test_equivalence() {
        let sampler = AdaptiveSampler::new(&strategies(), 10);
        assert!(sampler.equivalent_to(&sampler));
        assert!(sampler.equivalent_to(&AdaptiveSampler::new(&strategies(), 10)));
        assert!(!sampler.equivalent_to(&AdaptiveSampler::new(&strategies(), 5)));
        assert!(!sampler.equivalent_to(&AdaptiveSampler::new(
            &strategies().with_operation("C", 0.5),
            10
        )));
        assert!(!sampler.equivalent_to(&AdaptiveSampler::new(
            &PerOperationSamplingStrategies::new(0.0, 1.0)
                .with_operation("A", 1.0)
                .with_operation("B", 0.5),
            10
        )));
    }

    #[test]
    fn test_concurrent_registration() {
        let sampler = std::sync::Arc::new(AdaptiveSampler::new(
            &PerOperationSamplingStrategies::new(1.0, 0.0),
            100,
        ));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sampler = sampler.clone();
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        assert!(sampler.decide(TraceId::from(i), &format!("op-{}", (i + t) % 20)).sampled);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sampler.operations().len(), 20);
    }
}
