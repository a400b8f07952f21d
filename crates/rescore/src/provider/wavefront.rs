/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Wavefront-backed [`MetricProvider`] implementation.
//!
//! Reads go through the chart API (`GET /chart/api`): time series directly,
//! fault events via an `events(...)` query with tag filters. Writes use the
//! direct-ingestion endpoint (`POST /report`) in Wavefront line format.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{MetricProviderConnection, ResiliencyScoreProperties};
use crate::error::ProviderError;
use crate::models::{FaultEvent, Granularity, Metric, TimeSeriesSample};

use super::MetricProvider;

/// Event-tag key under which the owning service family is recorded.
const FAMILY_EVENT_TAG: &str = "ServiceFamily";

/// Event-tag key under which the target service is recorded.
const SERVICE_EVENT_TAG: &str = "service";

/// HTTP client for one Wavefront instance.
pub struct WavefrontProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    source: String,
}

impl WavefrontProvider {
    /// Builds a provider from the snapshot's connection section.
    ///
    /// The configured provider timeout is applied at the client level, so
    /// every call made through this provider inherits it.
    pub fn from_properties(
        properties: &ResiliencyScoreProperties,
    ) -> Result<Self, ProviderError> {
        let connection = properties
            .provider
            .as_ref()
            .ok_or(ProviderError::NotConfigured)?;
        Self::new(connection, properties.provider_timeout())
    }

    pub fn new(
        connection: &MetricProviderConnection,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            api_token: connection.api_token.clone(),
            source: connection.source.clone(),
        })
    }

    async fn chart_query(
        &self,
        query: &str,
        start_millis: i64,
        end_millis: i64,
        granularity: Granularity,
    ) -> Result<ChartResponse, ProviderError> {
        let url = format!("{}/chart/api", self.base_url);
        debug!(%query, start_millis, end_millis, %granularity, "Running chart query");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[
                ("strict", "true"),
                ("g", granularity.as_wire_code()),
                ("s", &start_millis.to_string()),
                ("e", &end_millis.to_string()),
                ("q", query),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ChartResponse>()
            .await
            .map_err(|err| ProviderError::Decode {
                message: err.to_string(),
            })
    }

    /// Builds the `events(...)` filter expression from the tag narrowing.
    fn event_query(
        tags: &BTreeMap<String, String>,
        family: Option<&str>,
        service: Option<&str>,
    ) -> String {
        let mut filters: Vec<String> = tags
            .iter()
            .map(|(key, value)| format!("eventTag=\"\\\"{}:{}\\\"\"", key, value))
            .collect();
        if let Some(family) = family {
            filters.push(format!("eventTag=\"\\\"{}:{}\\\"\"", FAMILY_EVENT_TAG, family));
        }
        if let Some(service) = service {
            filters.push(format!(
                "eventTag=\"\\\"{}:{}\\\"\"",
                SERVICE_EVENT_TAG, service
            ));
        }
        format!("events({})", filters.join(" and "))
    }

    /// Formats a metric as a Wavefront line-protocol point.
    fn metric_line(&self, metric: &Metric) -> String {
        let mut line = format!(
            "\"{}\" {} {} source=\"{}\"",
            metric.name,
            metric.value,
            metric.timestamp_millis / 1000,
            self.source
        );
        for (key, value) in &metric.tags {
            line.push_str(&format!(" \"{}\"=\"{}\"", key, value));
        }
        line
    }
}

#[async_trait]
impl MetricProvider for WavefrontProvider {
    async fn events(
        &self,
        tags: &BTreeMap<String, String>,
        family: Option<&str>,
        service: Option<&str>,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<FaultEvent>, ProviderError> {
        let query = Self::event_query(tags, family, service);
        let response = self
            .chart_query(&query, start_millis, end_millis, Granularity::Minute)
            .await?;

        Ok(response
            .events
            .into_iter()
            .map(|event| FaultEvent {
                name: event.name,
                start_millis: event.start,
                end_millis: event.end.unwrap_or(event.start),
                tags: event.tags,
            })
            .collect())
    }

    async fn time_series(
        &self,
        query: &str,
        start_millis: i64,
        end_millis: i64,
        granularity: Granularity,
    ) -> Result<Vec<TimeSeriesSample>, ProviderError> {
        let response = self
            .chart_query(query, start_millis, end_millis, granularity)
            .await?;

        Ok(response
            .timeseries
            .into_iter()
            .map(|series| {
                let points = series
                    .data
                    .into_iter()
                    // chart points are (epoch seconds, value)
                    .map(|(timestamp, value)| ((timestamp * 1000.0) as i64, value))
                    .collect();
                TimeSeriesSample::new(series.tags, points)
            })
            .collect())
    }

    async fn send_metric(&self, metric: &Metric) -> Result<(), ProviderError> {
        let url = format!("{}/report", self.base_url);
        let line = self.metric_line(metric);
        debug!(metric = %metric.name, value = metric.value, "Reporting metric point");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .query(&[("f", "wavefront")])
            .body(line)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(metric = %metric.name, status = status.as_u16(), "Metric report rejected");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    timeseries: Vec<ChartSeries>,
    #[serde(default)]
    events: Vec<ChartEvent>,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    data: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct ChartEvent {
    name: String,
    start: i64,
    #[serde(default)]
    end: Option<i64>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}
