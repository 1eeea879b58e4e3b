// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use dd_sampling_core::constants::{
    DEFAULT_INITIAL_SAMPLE_RATE, DEFAULT_MAX_OPERATIONS, DEFAULT_SAMPLING_REFRESH_INTERVAL,
    DEFAULT_SAMPLING_SERVER_URL, MAX_SAMPLING_REFRESH_INTERVAL,
};
use dd_sampling_core::utils::WorkerHandle;
use dd_sampling_core::{dd_debug, dd_error, dd_info, dd_warn, Config};
use opentelemetry::metrics::Meter;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::constants::WORKER_THREAD_NAME;
use crate::error::Error;
use crate::metrics::SamplerMetrics;
use crate::probabilistic_sampler::ProbabilisticSampler;
use crate::provider::{HttpStrategyProvider, StrategyProvider};
use crate::sampler::Sampler;
use crate::strategy::SamplingStrategyResponse;
use crate::translator::{translate, SamplerUpdate};
use crate::types::{SamplingResult, TraceId};

/// Options of a [`RemoteSampler`]
pub struct SamplerOptions {
    initial_sampler: Option<Sampler>,
    sampling_server_url: String,
    sampling_refresh_interval: Duration,
    max_operations: usize,
    metrics: SamplerMetrics,
    strategy_provider: Option<Arc<dyn StrategyProvider>>,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        SamplerOptions {
            initial_sampler: None,
            sampling_server_url: DEFAULT_SAMPLING_SERVER_URL.to_string(),
            sampling_refresh_interval: DEFAULT_SAMPLING_REFRESH_INTERVAL,
            max_operations: DEFAULT_MAX_OPERATIONS,
            metrics: SamplerMetrics::default(),
            strategy_provider: None,
        }
    }
}

impl fmt::Debug for SamplerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamplerOptions")
            .field("initial_sampler", &self.initial_sampler)
            .field("sampling_server_url", &self.sampling_server_url)
            .field("sampling_refresh_interval", &self.sampling_refresh_interval)
            .field("max_operations", &self.max_operations)
            .field("custom_strategy_provider", &self.strategy_provider.is_some())
            .finish()
    }
}

impl SamplerOptions {
    pub fn from_config(config: &Config) -> Self {
        let mut options = SamplerOptions::default();
        options
            .set_initial_sampler(ProbabilisticSampler::new(config.initial_sample_rate()).into())
            .set_sampling_server_url(config.sampling_server_url())
            .set_sampling_refresh_interval(config.sampling_refresh_interval())
            .set_max_operations(config.sampling_max_operations());
        options
    }

    /// Sampler used until a strategy is fetched, probabilistic at 0.001 by default
    pub fn set_initial_sampler(&mut self, sampler: Sampler) -> &mut Self {
        self.initial_sampler = Some(sampler);
        self
    }

    /// An empty url is ignored
    pub fn set_sampling_server_url(&mut self, url: impl Into<String>) -> &mut Self {
        let url = url.into();
        if !url.is_empty() {
            self.sampling_server_url = url;
        }
        self
    }

    /// A zero interval is ignored, intervals longer than a year are capped to one year
    pub fn set_sampling_refresh_interval(&mut self, interval: Duration) -> &mut Self {
        if !interval.is_zero() {
            self.sampling_refresh_interval = interval.min(MAX_SAMPLING_REFRESH_INTERVAL);
        }
        self
    }

    /// A zero cap is ignored
    pub fn set_max_operations(&mut self, max_operations: usize) -> &mut Self {
        if max_operations > 0 {
            self.max_operations = max_operations;
        }
        self
    }

    /// Meter recording the refresh cycle counters
    pub fn set_meter(&mut self, meter: &Meter) -> &mut Self {
        self.metrics = SamplerMetrics::new(meter);
        self
    }

    /// Replaces the HTTP provider built from the sampling server url
    pub fn set_strategy_provider(&mut self, provider: Arc<dyn StrategyProvider>) -> &mut Self {
        self.strategy_provider = Some(provider);
        self
    }
}

/// A sampler whose strategy is controlled by a remote sampling server.
///
/// A background thread fetches the strategy of the service every refresh interval and
/// swaps or updates the active sampler accordingly. Sampling decisions never wait on the
/// sampling server: until a strategy is retrieved, or while the server is unreachable, the
/// last known sampler keeps deciding.
///
/// Handles are cheap to clone and share the same active sampler and worker. The worker is
/// stopped by [`RemoteSampler::close`], or when the last handle is dropped.
///
/// ```no_run
/// use dd_remote_sampling::{RemoteSampler, SamplerOptions, TraceId};
///
/// let sampler = RemoteSampler::new("my-service", SamplerOptions::default()).unwrap();
/// let result = sampler.decide(TraceId::from(42u64), "GET /users");
/// println!("sampled: {}", result.sampled);
/// sampler.close();
/// ```
#[derive(Clone)]
pub struct RemoteSampler {
    inner: Arc<RemoteSamplerInner>,
}

struct RemoteSamplerInner {
    state: Arc<SamplerState>,
    closed: AtomicBool,
    worker: WorkerHandle,
}

/// State shared with the worker thread
struct SamplerState {
    service_name: String,
    sampler: RwLock<Sampler>,
    max_operations: usize,
    metrics: SamplerMetrics,
    strategy_provider: Arc<dyn StrategyProvider>,
}

impl fmt::Debug for RemoteSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSampler")
            .field("service_name", &self.inner.state.service_name)
            .field("sampler", &*self.inner.state.read_sampler())
            .field("closed", &self.inner.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl RemoteSampler {
    /// Creates the sampler and starts polling the sampling server.
    ///
    /// The first strategy is fetched one refresh interval after creation.
    pub fn new(
        service_name: impl Into<String>,
        options: SamplerOptions,
    ) -> dd_sampling_core::Result<Self> {
        let SamplerOptions {
            initial_sampler,
            sampling_server_url,
            sampling_refresh_interval,
            max_operations,
            metrics,
            strategy_provider,
        } = options;

        let strategy_provider: Arc<dyn StrategyProvider> = match strategy_provider {
            Some(provider) => provider,
            None => Arc::new(HttpStrategyProvider::new(&sampling_server_url)?),
        };
        let initial_sampler = initial_sampler
            .unwrap_or_else(|| ProbabilisticSampler::new(DEFAULT_INITIAL_SAMPLE_RATE).into());

        let state = Arc::new(SamplerState {
            service_name: service_name.into(),
            sampler: RwLock::new(initial_sampler),
            max_operations,
            metrics,
            strategy_provider,
        });

        let worker_state = state.clone();
        let worker = WorkerHandle::spawn(WORKER_THREAD_NAME, move |cancel_token| {
            run_worker(worker_state, sampling_refresh_interval, cancel_token)
        })
        .map_err(Error::WorkerSpawn)?;

        Ok(RemoteSampler {
            inner: Arc::new(RemoteSamplerInner {
                state,
                closed: AtomicBool::new(false),
                worker,
            }),
        })
    }

    /// Creates a sampler for the service and sampling settings of `config`.
    ///
    /// The library log level is set from the configuration as well.
    pub fn from_config(config: &Config) -> dd_sampling_core::Result<Self> {
        dd_sampling_core::log::set_max_level(config.log_level());
        Self::new(config.service(), SamplerOptions::from_config(config))
    }

    pub fn service_name(&self) -> &str {
        &self.inner.state.service_name
    }

    /// Decides whether the trace should be sampled with the active sampler
    pub fn decide(&self, trace_id: TraceId, operation: &str) -> SamplingResult {
        self.inner.state.read_sampler().decide(trace_id, operation)
    }

    /// Stops the worker and waits for its thread to exit.
    ///
    /// Only the first call has an effect.
    pub fn close(&self) {
        if self
            .inner
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            dd_warn!("Repeated attempt to close the sampler is ignored");
            return;
        }
        if let Err(e) = self.inner.worker.shutdown() {
            dd_error!("RemoteSampler: failed to stop the worker: {}", e);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Compares the active samplers of both remote samplers
    pub fn equivalent_to(&self, other: &RemoteSampler) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        // Locks are taken in address order so that concurrent comparisons in both
        // directions cannot deadlock against pending writers
        if Arc::as_ptr(&self.inner) < Arc::as_ptr(&other.inner) {
            let sampler = self.inner.state.read_sampler();
            let other_sampler = other.inner.state.read_sampler();
            sampler.equivalent_to(&other_sampler)
        } else {
            let other_sampler = other.inner.state.read_sampler();
            let sampler = self.inner.state.read_sampler();
            sampler.equivalent_to(&other_sampler)
        }
    }

    /// Runs `f` on the active sampler
    pub fn with_active_sampler<R>(&self, f: impl FnOnce(&Sampler) -> R) -> R {
        f(&self.inner.state.read_sampler())
    }
}

impl SamplerState {
    fn read_sampler(&self) -> RwLockReadGuard<'_, Sampler> {
        self.sampler.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn update_sampler(&self) {
        let response = match self
            .strategy_provider
            .fetch_strategy(&self.service_name)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.metrics.sampler_query_failure.add(1, &[]);
                dd_info!("RemoteSampler: unable to query sampling strategy: {:#}", e);
                return;
            }
        };
        self.metrics.sampler_retrieved.add(1, &[]);

        match self.apply_strategy(&response) {
            Ok(true) => {
                self.metrics.sampler_updated.add(1, &[]);
                dd_debug!("RemoteSampler: sampler updated from {:?}", response);
            }
            Ok(false) => {}
            Err(e) => {
                self.metrics.sampler_update_failure.add(1, &[]);
                dd_error!(
                    "RemoteSampler: unable to handle sampling strategy response {:?}: {}",
                    response,
                    e
                );
            }
        }
    }

    /// Returns whether the active sampler changed
    fn apply_strategy(&self, response: &SamplingStrategyResponse) -> Result<bool, Error> {
        let update = translate(response)?;
        let mut sampler = self.sampler.write().unwrap_or_else(PoisonError::into_inner);

        if let SamplerUpdate::Adaptive(strategies) = update {
            // Merging keeps the state of operations missing from the response
            match sampler.as_adaptive_mut() {
                Some(adaptive) => adaptive.merge(strategies),
                None => *sampler = update.build(self.max_operations),
            }
            return Ok(true);
        }

        let candidate = update.build(self.max_operations);
        if sampler.equivalent_to(&candidate) {
            return Ok(false);
        }
        *sampler = candidate;
        Ok(true)
    }
}

fn run_worker(
    state: Arc<SamplerState>,
    refresh_interval: Duration,
    cancel_token: CancellationToken,
) {
    dd_debug!(
        "RemoteSampler: started worker for service {}",
        state.service_name
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            dd_error!("RemoteSampler: failed to create Tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async {
        // First fetch one interval after start
        let mut ticker =
            tokio::time::interval_at(Instant::now() + refresh_interval, refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // An in-flight request is dropped on cancellation, the active sampler is only
            // written once the response is in
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                _ = state.update_sampler() => {}
            }
        }
    });

    dd_debug!("RemoteSampler: worker stopped");
}
