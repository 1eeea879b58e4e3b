// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared constants for the dd-remote-sampling crate

/// Sampling rate limits
pub mod rate {
    /// Maximum sampling rate
    pub const MAX_SAMPLE_RATE: f64 = 1.0;
    /// Minimum sampling rate
    pub const MIN_SAMPLE_RATE: f64 = 0.0;
}

/// Numeric constants used in sampling algorithms
pub mod numeric {
    /// Knuth's multiplicative hash factor for deterministic sampling
    pub const KNUTH_FACTOR: u64 = 1_111_111_111_111_111_111;
    /// Maximum 64-bit unsigned integer value
    pub const MAX_UINT_64BITS: u64 = u64::MAX;
}

/// Tags attached to sampling decisions
pub mod tags {
    /// Kind of sampler that took the decision
    pub const SAMPLER_TYPE: &str = "sampler.type";
    /// Parameter of the sampler that took the decision
    pub const SAMPLER_PARAM: &str = "sampler.param";

    pub const SAMPLER_TYPE_PROBABILISTIC: &str = "probabilistic";
    pub const SAMPLER_TYPE_RATE_LIMITING: &str = "ratelimiting";
    pub const SAMPLER_TYPE_LOWER_BOUND: &str = "lowerbound";
}

/// Names of the counters reported by the remote sampler
pub mod metric {
    /// Instrumentation scope of the counters
    pub const METER_NAME: &str = "dd-remote-sampling";
    /// A strategy was fetched from the sampling server
    pub const SAMPLER_RETRIEVED: &str = "sampler.retrieved";
    /// Fetching a strategy failed
    pub const SAMPLER_QUERY_FAILURE: &str = "sampler.query_failure";
    /// The active sampler was updated from a fetched strategy
    pub const SAMPLER_UPDATED: &str = "sampler.updated";
    /// A fetched strategy could not be applied
    pub const SAMPLER_UPDATE_FAILURE: &str = "sampler.update_failure";
}

/// Timeout of a single strategy request
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// Name of the thread polling the sampling server
pub const WORKER_THREAD_NAME: &str = "dd-remote-sampler";
