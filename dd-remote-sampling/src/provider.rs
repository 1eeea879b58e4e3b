// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sources of sampling strategies

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::Context;
use http_body_util::{BodyExt, Empty};
use hyper::{body::Bytes, Method, Request};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::constants::DEFAULT_REQUEST_TIMEOUT;
use crate::error::Error;
use crate::strategy::SamplingStrategyResponse;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetches the sampling strategy of a service.
///
/// Implementations are called once per refresh interval from the remote sampler worker and
/// must complete, successfully or not, in a bounded time.
pub trait StrategyProvider: Send + Sync {
    fn fetch_strategy<'a>(
        &'a self,
        service_name: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<SamplingStrategyResponse>>;
}

/// Queries `GET <server url>?service=<service name>` and decodes the JSON body
pub struct HttpStrategyProvider {
    server_url: url::Url,
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl fmt::Debug for HttpStrategyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStrategyProvider")
            .field("server_url", &self.server_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpStrategyProvider {
    pub fn new(server_url: &str) -> Result<Self, Error> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, Error> {
        let server_url = url::Url::parse(server_url).map_err(|source| Error::InvalidServerUrl {
            url: server_url.to_string(),
            source,
        })?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(HttpStrategyProvider {
            server_url,
            client,
            timeout,
        })
    }

    /// Url queried for `service_name`
    pub fn strategy_url(&self, service_name: &str) -> url::Url {
        let mut url = self.server_url.clone();
        url.query_pairs_mut().append_pair("service", service_name);
        url
    }

    async fn fetch(&self, service_name: &str) -> anyhow::Result<SamplingStrategyResponse> {
        let url = self.strategy_url(service_name);
        let req = Request::builder()
            .method(Method::GET)
            .uri(url.as_str())
            .header("user-agent", "dd-remote-sampling")
            .body(Empty::new())
            .context("Failed to build request")?;

        let response = self
            .client
            .request(req)
            .await
            .with_context(|| format!("Failed to query {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Sampling server returned error status: {}",
                response.status()
            ));
        }

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .context("Failed to read response body")?
            .to_bytes();

        serde_json::from_slice(&body_bytes).with_context(|| {
            format!(
                "Failed to parse sampling strategy {:?}",
                String::from_utf8_lossy(&body_bytes)
            )
        })
    }
}

impl StrategyProvider for HttpStrategyProvider {
    fn fetch_strategy<'a>(
        &'a self,
        service_name: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<SamplingStrategyResponse>> {
        Box::pin(async move {
            tokio::time::timeout(self.timeout, self.fetch(service_name))
                .await
                .map_err(|_| {
                    anyhow::anyhow!("Sampling strategy request timed out after {:?}", self.timeout)
                })?
        })
    }
}
