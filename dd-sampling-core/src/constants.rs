// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

pub const DEFAULT_SERVICE_NAME: &str = "unnamed-rust-service";

/// Sampling strategy endpoint exposed by a local agent
pub const DEFAULT_SAMPLING_SERVER_URL: &str = "http://localhost:5778/sampling";

pub const DEFAULT_SAMPLING_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Longer refresh intervals are capped to this value
pub const MAX_SAMPLING_REFRESH_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cap on the number of operations tracked by a per-operation sampler
pub const DEFAULT_MAX_OPERATIONS: usize = 2000;

/// Probability used until the first strategy is fetched
pub const DEFAULT_INITIAL_SAMPLE_RATE: f64 = 0.001;
