// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;

use crate::strategy::SamplingStrategyType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The response carried neither a per-operation, probabilistic nor rate limiting strategy
    #[error("unsupported sampling strategy type {}", display_strategy_type(.0))]
    UnsupportedStrategy(Option<SamplingStrategyType>),
    #[error("invalid sampling server url {url:?}: {source}")]
    InvalidServerUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to spawn the remote sampler worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

fn display_strategy_type(strategy_type: &Option<SamplingStrategyType>) -> &'static str {
    strategy_type.as_ref().map_or("<none>", SamplingStrategyType::as_str)
}
