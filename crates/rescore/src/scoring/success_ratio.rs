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

//! Success-ratio scoring: compares per-endpoint request success rates
//! before a fault against the rates after recovery.
//!
//! Endpoints are discovered from the metrics themselves: two count queries
//! (total and successful requests), grouped by an endpoint tag, are run over
//! each window. Unlike the alert-ratio strategy an out-of-range ratio is
//! clamped to 1 here, not discarded, and the aggregation stays per-event:
//! one score and one metric set per fault event, never folded across events.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ResiliencyMetricConfig, SuccessRatioConfig};
use crate::models::{FaultEvent, Granularity, Metric, Service};
use crate::provider::MetricProvider;

use super::aggregate::mean;
use super::window::{post_window, pre_window};

/// Placeholder replaced with the scored service's name in count queries.
const SERVICE_PLACEHOLDER: &str = "{service}";

/// Tag key carrying the fault event's name on emitted metrics.
const FAULT_TAG: &str = "fault";

/// Per-endpoint result for one fault event.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointScore {
    pub endpoint: String,
    /// Baseline success rate over the pre-fault window.
    pub pre_ratio: f64,
    /// Recovery rate relative to baseline, clamped to 1.
    pub resiliency: f64,
    /// `(1 - alpha) * pre_ratio`, present when the functional split is on.
    pub functional_part: Option<f64>,
    /// `alpha * resiliency`, present when the functional split is on.
    pub non_functional_part: Option<f64>,
    /// The value the endpoint contributes to the event's service score.
    pub overall: f64,
}

/// One fault event's scores across every endpoint that had data.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSuccessScore {
    pub event_name: String,
    pub event_end_millis: i64,
    pub endpoints: Vec<EndpointScore>,
    /// Arithmetic mean of the endpoint overalls; `None` without endpoints.
    pub service_score: Option<f64>,
}

impl EventSuccessScore {
    /// Whether the event's metrics should be reported.
    ///
    /// Only scores in `(0, 1]` are sent; a zero or absent score means the
    /// data was too thin to stand behind.
    pub fn should_emit(&self) -> bool {
        matches!(self.service_score, Some(score) if score > 0.0 && score <= 1.0)
    }

    fn functional_mean(&self) -> Option<f64> {
        let parts: Vec<f64> = self
            .endpoints
            .iter()
            .filter_map(|endpoint| endpoint.functional_part)
            .collect();
        mean(&parts)
    }

    fn non_functional_mean(&self) -> Option<f64> {
        let parts: Vec<f64> = self
            .endpoints
            .iter()
            .filter_map(|endpoint| endpoint.non_functional_part)
            .collect();
        mean(&parts)
    }

    /// Assembles the metric set for this event.
    ///
    /// One point per endpoint under the url metric name, one point for the
    /// service under the main metric name, and, when the functional split
    /// produced values in `(0, 1]`, a functional and a non-functional point.
    pub fn build_metrics(
        &self,
        config: &ResiliencyMetricConfig,
        endpoint_tag: &str,
        base_tags: &BTreeMap<String, String>,
        source: &str,
    ) -> Vec<Metric> {
        let mut metrics = Vec::new();
        let mut service_tags = base_tags.clone();
        service_tags.insert(FAULT_TAG.to_string(), self.event_name.clone());

        if let Some(url_metric_name) = &config.url_metric_name {
            for endpoint in &self.endpoints {
                let mut tags = BTreeMap::new();
                tags.insert(endpoint_tag.to_string(), endpoint.endpoint.clone());
                tags.insert(FAULT_TAG.to_string(), self.event_name.clone());
                metrics.push(Metric::new(
                    url_metric_name.clone(),
                    endpoint.overall,
                    self.event_end_millis,
                    tags,
                    source,
                ));
            }
        }

        if let Some(score) = self.service_score {
            metrics.push(Metric::new(
                config.metric_name.clone(),
                score,
                self.event_end_millis,
                service_tags.clone(),
                source,
            ));
        }

        if let (Some(functional), Some(non_functional)) =
            (self.functional_mean(), self.non_functional_mean())
        {
            if functional > 0.0 && functional <= 1.0 {
                if let Some(name) = &config.functional_metric_name {
                    metrics.push(Metric::new(
                        name.clone(),
                        functional,
                        self.event_end_millis,
                        service_tags.clone(),
                        source,
                    ));
                }
                if let Some(name) = &config.non_functional_metric_name {
                    metrics.push(Metric::new(
                        name.clone(),
                        non_functional,
                        self.event_end_millis,
                        service_tags,
                        source,
                    ));
                }
            }
        }

        metrics
    }
}

/// Scores a service from per-endpoint request success rates.
pub struct SuccessRatioScorer {
    provider: Arc<dyn MetricProvider>,
    config: SuccessRatioConfig,
    /// Weight `alpha` of the recovery part; `None` disables the split.
    functional_split: Option<f64>,
    reference_window_minutes: i64,
    granularity: Granularity,
}

impl SuccessRatioScorer {
    pub fn new(
        provider: Arc<dyn MetricProvider>,
        config: SuccessRatioConfig,
        functional_split: Option<f64>,
        reference_window_minutes: i64,
        granularity: Granularity,
    ) -> Self {
        Self {
            provider,
            config,
            functional_split,
            reference_window_minutes,
            granularity,
        }
    }

    /// Scores every given event independently.
    ///
    /// The caller filters to completed, in-window events; this method takes
    /// the list as-is.
    pub async fn score(&self, service: &Service, events: &[FaultEvent]) -> Vec<EventSuccessScore> {
        let mut event_scores = Vec::with_capacity(events.len());

        for event in events {
            debug!(event = %event.name, service = %service.name, "Scoring fault event");
            let pre = pre_window(event, self.reference_window_minutes);
            let post = post_window(event, self.reference_window_minutes);

            let pre_ratios = self
                .endpoint_ratios(service, pre.start_millis, pre.end_millis)
                .await;
            let post_ratios = self
                .endpoint_ratios(service, post.start_millis, post.end_millis)
                .await;

            let mut endpoints = Vec::new();
            for (endpoint, post_ratio) in &post_ratios {
                // An endpoint with no baseline cannot be compared.
                let Some(pre_ratio) = pre_ratios.get(endpoint) else {
                    debug!(endpoint, "No pre-fault data; endpoint skipped");
                    continue;
                };

                let mut resiliency = if *pre_ratio != 0.0 {
                    post_ratio / pre_ratio
                } else {
                    0.0
                };
                if resiliency > 1.0 {
                    resiliency = 1.0;
                }

                let (functional_part, non_functional_part, overall) = match self.functional_split {
                    Some(alpha) => {
                        let functional = (1.0 - alpha) * pre_ratio;
                        let non_functional = alpha * resiliency;
                        (
                            Some(functional),
                            Some(non_functional),
                            functional + non_functional,
                        )
                    }
                    None => (None, None, resiliency),
                };

                endpoints.push(EndpointScore {
                    endpoint: endpoint.clone(),
                    pre_ratio: *pre_ratio,
                    resiliency,
                    functional_part,
                    non_functional_part,
                    overall,
                });
            }

            let overalls: Vec<f64> = endpoints.iter().map(|e| e.overall).collect();
            event_scores.push(EventSuccessScore {
                event_name: event.name.clone(),
                event_end_millis: event.end_millis,
                service_score: mean(&overalls),
                endpoints,
            });
        }

        event_scores
    }

    /// Success rate per endpoint over one window.
    ///
    /// An endpoint whose total count is zero stays in the map at ratio 0.0,
    /// so a dead endpoint drags the window down instead of disappearing from
    /// it. A missing success count for a present total reads as zero
    /// successes.
    async fn endpoint_ratios(
        &self,
        service: &Service,
        start_millis: i64,
        end_millis: i64,
    ) -> BTreeMap<String, f64> {
        let totals = self
            .endpoint_counts(&self.config.total_query, service, start_millis, end_millis)
            .await;
        let successes = self
            .endpoint_counts(&self.config.success_query, service, start_millis, end_millis)
            .await;

        let mut ratios = BTreeMap::new();
        for (endpoint, total) in totals {
            if total == 0.0 {
                ratios.insert(endpoint, 0.0);
                continue;
            }
            let success = successes.get(&endpoint).copied().unwrap_or(0.0);
            ratios.insert(endpoint, success / total);
        }
        ratios
    }

    async fn endpoint_counts(
        &self,
        template: &str,
        service: &Service,
        start_millis: i64,
        end_millis: i64,
    ) -> BTreeMap<String, f64> {
        let query = template.replace(SERVICE_PLACEHOLDER, &service.name);
        let series = match self
            .provider
            .time_series(&query, start_millis, end_millis, self.granularity)
            .await
        {
            Ok(series) => series,
            Err(error) => {
                warn!(%query, %error, "Count fetch failed; window excluded");
                return BTreeMap::new();
            }
        };

        let mut counts = BTreeMap::new();
        for sample in series {
            let Some(endpoint) = sample.tags.get(&self.config.endpoint_tag) else {
                continue;
            };
            *counts.entry(endpoint.clone()).or_insert(0.0) += sample.value_sum();
        }
        counts
    }
}
