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

//! Shared fakes and builders for the integration tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use rescore::config::{
    FamilyConfig, MetricProviderConnection, ResiliencyMetricConfig, ResiliencyScoreProperties,
    ServiceConfig, SuccessRatioConfig,
};
use rescore::error::ProviderError;
use rescore::models::{FaultEvent, Granularity, Metric, QueryDefinition, TimeSeriesSample};
use rescore::provider::MetricProvider;

pub const REF_MINUTES: i64 = 15;

/// Canned monitoring backend.
///
/// Events are keyed by the family filter the engine asks for; series by
/// (query, window start). Queries listed as failing return a decode error,
/// standing in for a flaky backend call.
#[derive(Default)]
pub struct FakeProvider {
    events_by_family: HashMap<Option<String>, Vec<FaultEvent>>,
    series: HashMap<(String, i64), Vec<TimeSeriesSample>>,
    failing_queries: HashSet<String>,
    pub sent: Mutex<Vec<Metric>>,
    active_fetches: AtomicUsize,
    pub max_active_fetches: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, family: Option<&str>, event: FaultEvent) -> Self {
        self.events_by_family
            .entry(family.map(str::to_string))
            .or_default()
            .push(event);
        self
    }

    pub fn with_series(
        mut self,
        query: &str,
        start_millis: i64,
        tags: &[(&str, &str)],
        values: &[f64],
    ) -> Self {
        let tags: BTreeMap<String, String> = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, value)| (start_millis + i as i64 * 60_000, *value))
            .collect();
        self.series
            .entry((query.to_string(), start_millis))
            .or_default()
            .push(TimeSeriesSample::new(tags, points));
        self
    }

    pub fn with_failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn sent_metrics(&self) -> Vec<Metric> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricProvider for FakeProvider {
    async fn events(
        &self,
        _tags: &BTreeMap<String, String>,
        family: Option<&str>,
        _service: Option<&str>,
        _start_millis: i64,
        _end_millis: i64,
    ) -> Result<Vec<FaultEvent>, ProviderError> {
        Ok(self
            .events_by_family
            .get(&family.map(str::to_string))
            .cloned()
            .unwrap_or_default())
    }

    async fn time_series(
        &self,
        query: &str,
        start_millis: i64,
        _end_millis: i64,
        _granularity: Granularity,
    ) -> Result<Vec<TimeSeriesSample>, ProviderError> {
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_fetches.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);

        if self.failing_queries.contains(query) {
            return Err(ProviderError::Decode {
                message: "backend unavailable".to_string(),
            });
        }
        Ok(self
            .series
            .get(&(query.to_string(), start_millis))
            .cloned()
            .unwrap_or_default())
    }

    async fn send_metric(&self, metric: &Metric) -> Result<(), ProviderError> {
        self.sent.lock().unwrap().push(metric.clone());
        Ok(())
    }
}

pub fn query(condition: &str, weight: f64) -> QueryDefinition {
    QueryDefinition {
        name: condition.to_string(),
        condition: condition.to_string(),
        weight,
        granularity: Granularity::Minute,
    }
}

/// A fault event ending ten minutes ago, safely inside a 1 hour lookback.
pub fn recent_event(name: &str) -> FaultEvent {
    let end_millis = Utc::now().timestamp_millis() - 10 * 60_000;
    let mut tags = BTreeMap::new();
    tags.insert("details".to_string(), format!("{} COMPLETED", name));
    FaultEvent {
        name: name.to_string(),
        start_millis: end_millis - 5 * 60_000,
        end_millis,
        tags,
    }
}

/// Pre-window fetch key for an event scored with [`REF_MINUTES`].
pub fn pre_start(event: &FaultEvent) -> i64 {
    event.start_millis - REF_MINUTES * 60_000
}

/// Post-window fetch key for an event.
pub fn post_start(event: &FaultEvent) -> i64 {
    event.end_millis
}

pub fn service_config(name: &str, queries: Vec<QueryDefinition>) -> ServiceConfig {
    ServiceConfig {
        name: name.to_string(),
        tags: BTreeMap::new(),
        queries,
    }
}

pub fn family(name: &str, services: Vec<ServiceConfig>) -> FamilyConfig {
    FamilyConfig {
        name: name.to_string(),
        queries: Vec::new(),
        services,
    }
}

/// A complete snapshot with a 1 hour lookback and 15 minute reference window.
pub fn properties(families: Vec<FamilyConfig>) -> ResiliencyScoreProperties {
    ResiliencyScoreProperties {
        provider: Some(MetricProviderConnection {
            base_url: "https://metrics.example.com".to_string(),
            api_token: "token".to_string(),
            source: "rescore-test".to_string(),
            proxy_host: None,
            proxy_port: None,
        }),
        metrics: Some(ResiliencyMetricConfig {
            metric_name: "resiliency.score".to_string(),
            url_metric_name: Some("resiliency.url.score".to_string()),
            functional_metric_name: None,
            non_functional_metric_name: None,
            lookback_hours: 1,
            reference_window_minutes: REF_MINUTES,
            granularity: Granularity::Minute,
        }),
        tags: BTreeMap::new(),
        families,
        functional_split: None,
        success_ratio: Some(SuccessRatioConfig {
            total_query: "total:{service}".to_string(),
            success_query: "success:{service}".to_string(),
            endpoint_tag: "url".to_string(),
        }),
        max_concurrent_services: 4,
        provider_timeout_secs: 5,
    }
}
