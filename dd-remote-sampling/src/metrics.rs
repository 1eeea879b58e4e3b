// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Counters reported by the remote sampler.
//!
//! Counters are recorded through an OpenTelemetry [`Meter`]. Without one, they are recorded
//! on a meter provider with no reader and never exported.

use std::fmt;

use opentelemetry::metrics::{Counter, Meter, MeterProvider};
use opentelemetry_sdk::metrics::SdkMeterProvider;

use crate::constants::metric;

/// Counters updated by every refresh cycle
#[derive(Clone)]
pub struct SamplerMetrics {
    pub sampler_retrieved: Counter<u64>,
    pub sampler_query_failure: Counter<u64>,
    pub sampler_updated: Counter<u64>,
    pub sampler_update_failure: Counter<u64>,
}

impl SamplerMetrics {
    pub fn new(meter: &Meter) -> Self {
        SamplerMetrics {
            sampler_retrieved: meter
                .u64_counter(metric::SAMPLER_RETRIEVED)
                .with_description("Sampling strategies fetched from the sampling server")
                .build(),
            sampler_query_failure: meter
                .u64_counter(metric::SAMPLER_QUERY_FAILURE)
                .with_description("Failed sampling strategy requests")
                .build(),
            sampler_updated: meter
                .u64_counter(metric::SAMPLER_UPDATED)
                .with_description("Updates of the active sampler")
                .build(),
            sampler_update_failure: meter
                .u64_counter(metric::SAMPLER_UPDATE_FAILURE)
                .with_description("Fetched sampling strategies that could not be applied")
                .build(),
        }
    }
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new(&SdkMeterProvider::builder().build().meter(metric::METER_NAME))
    }
}

impl fmt::Debug for SamplerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use opentelemetry::metrics::{Meter, MeterProvider};
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    use crate::constants::metric;

    /// Meter provider exporting to memory, read back on demand
    pub(crate) struct MetricsCapture {
        provider: SdkMeterProvider,
        exporter: InMemoryMetricExporter,
    }

    impl MetricsCapture {
        pub(crate) fn new() -> Self {
            let exporter = InMemoryMetricExporter::default();
            let provider = SdkMeterProvider::builder()
                .with_reader(PeriodicReader::builder(exporter.clone()).build())
                .build();
            Self { provider, exporter }
        }

        pub(crate) fn meter(&self) -> Meter {
            self.provider.meter(metric::METER_NAME)
        }

        /// Current value of a counter, 0 if it was never incremented
        pub(crate) fn counter_value(&self, name: &str) -> u64 {
            self.provider.force_flush().unwrap();
            let exported = self.exporter.get_finished_metrics().unwrap();
            // Cumulative temporality: the last export holds the totals
            let Some(last) = exported.last() else {
                return 0;
            };
            last.scope_metrics()
                .flat_map(|scope| scope.metrics())
                .filter(|m| m.name() == name)
                .map(|m| match m.data() {
                    AggregatedMetrics::U64(MetricData::Sum(sum)) => {
                        sum.data_points().map(|point| point.value()).sum()
                    }
                    _ => 0,
                })
                .sum()
        }
    }
}
