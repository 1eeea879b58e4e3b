// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Configuration keys understood by [`crate::Config`]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedConfigurations {
    DD_SERVICE,
    DD_LOG_LEVEL,
    DD_TRACE_SAMPLE_RATE,
    DD_TRACE_SAMPLING_SERVER_URL,
    /// Seconds between two strategy fetches
    DD_TRACE_SAMPLING_REFRESH_INTERVAL,
    DD_TRACE_SAMPLING_MAX_OPERATIONS,
}

impl SupportedConfigurations {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DD_SERVICE => "DD_SERVICE",
            Self::DD_LOG_LEVEL => "DD_LOG_LEVEL",
            Self::DD_TRACE_SAMPLE_RATE => "DD_TRACE_SAMPLE_RATE",
            Self::DD_TRACE_SAMPLING_SERVER_URL => "DD_TRACE_SAMPLING_SERVER_URL",
            Self::DD_TRACE_SAMPLING_REFRESH_INTERVAL => "DD_TRACE_SAMPLING_REFRESH_INTERVAL",
            Self::DD_TRACE_SAMPLING_MAX_OPERATIONS => "DD_TRACE_SAMPLING_MAX_OPERATIONS",
        }
    }
}
