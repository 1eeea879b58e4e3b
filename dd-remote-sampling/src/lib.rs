// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! A sampler whose strategy is controlled by a remote sampling server.
//!
//! [`RemoteSampler`] periodically fetches the sampling strategy of a service and hot-swaps
//! the sampler used for every sampling decision, without ever blocking decisions on the
//! network. It can be used directly or plugged into an OpenTelemetry tracer provider.

pub mod constants;
pub mod metrics;
pub mod provider;
pub mod strategy;
pub mod translator;

mod adaptive_sampler;
mod error;
mod guaranteed_throughput_sampler;
mod otel;
mod probabilistic_sampler;
mod rate_limiter;
mod rate_limiting_sampler;
mod remote_sampler;
mod sampler;
mod types;

// Re-exports for convenient usage
pub use adaptive_sampler::AdaptiveSampler;
pub use error::Error;
pub use guaranteed_throughput_sampler::GuaranteedThroughputSampler;
pub use probabilistic_sampler::ProbabilisticSampler;
pub use rate_limiter::RateLimiter;
pub use rate_limiting_sampler::RateLimitingSampler;
pub use remote_sampler::{RemoteSampler, SamplerOptions};
pub use sampler::Sampler;
pub use types::{SamplingResult, Tag, TagValue, TraceId};
