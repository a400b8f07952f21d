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

//! Concurrent scoring across every configured service.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ResiliencyMetricConfig, ResiliencyScoreProperties};
use crate::error::ScoreError;
use crate::models::{FaultEvent, Metric, Score, Service};
use crate::provider::MetricProvider;
use crate::scoring::aggregate::mean;
use crate::scoring::alert_ratio::AlertRatioScorer;
use crate::scoring::success_ratio::SuccessRatioScorer;
use crate::scoring::window::{filter_events, overall_window, TimeWindow};
use crate::COMMON_SERVICE_FAMILY;

use super::task_executor::SERVICE_TAG;

/// Tag key carrying the owning family's name on emitted metrics.
const SERVICE_FAMILY_TAG: &str = "service_family";

/// Which scoring strategy a batch run applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Alert-condition queries compared across the fault windows.
    Alert,
    /// Per-endpoint request success rates compared across the fault windows.
    Success,
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "alert" => Ok(ScoringMode::Alert),
            "success" => Ok(ScoringMode::Success),
            other => Err(format!(
                "unknown scoring mode '{}' (expected 'alert' or 'success')",
                other
            )),
        }
    }
}

/// Outcome of one service's unit of work in a batch run.
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub family: String,
    pub service_name: String,
    /// Final score, when one was computed.
    pub score: Option<f64>,
    /// Why no score was computed, when it wasn't.
    pub error: Option<String>,
}

/// Per-service outcomes of a completed batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ServiceOutcome>,
}

impl BatchSummary {
    pub fn scored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.score.is_some()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.scored()
    }
}

/// Fans scoring out over every configured (family, service) pair.
///
/// Events are fetched once per family and shared across the family's
/// services; events recorded under the designated common family apply to
/// every family. Units run on a bounded pool, a failure inside one unit
/// never cancels its siblings, and `run_all` returns only after every unit
/// finished. No cross-service aggregation happens here.
pub struct BatchCoordinator {
    provider: Arc<dyn MetricProvider>,
    properties: Arc<ResiliencyScoreProperties>,
    mode: ScoringMode,
}

impl BatchCoordinator {
    pub fn new(
        provider: Arc<dyn MetricProvider>,
        properties: Arc<ResiliencyScoreProperties>,
        mode: ScoringMode,
    ) -> Self {
        Self {
            provider,
            properties,
            mode,
        }
    }

    pub async fn run_all(&self) -> Result<BatchSummary, ScoreError> {
        if self.properties.provider.is_none() {
            return Err(ScoreError::ProviderConfigMissing);
        }
        let metrics = self
            .properties
            .metrics
            .clone()
            .ok_or(ScoreError::MetricConfigMissing)?;
        if self.mode == ScoringMode::Success && self.properties.success_ratio.is_none() {
            return Err(ScoreError::SuccessRatioConfigMissing);
        }

        let now_millis = Utc::now().timestamp_millis();
        let window = overall_window(now_millis, metrics.lookback_hours);

        let family_events = self.fetch_family_events(&window).await;
        let semaphore = Arc::new(Semaphore::new(self.properties.max_concurrent_services));

        let mut handles: Vec<JoinHandle<ServiceOutcome>> = Vec::new();
        for family in &self.properties.families {
            let events = family_events
                .get(&family.name)
                .cloned()
                .unwrap_or_default();
            for service_config in &family.services {
                let service = match self.properties.find_service(&service_config.name) {
                    Some(service) => service,
                    None => continue,
                };
                handles.push(self.spawn_unit(
                    service,
                    events.clone(),
                    window,
                    metrics.clone(),
                    semaphore.clone(),
                ));
            }
        }

        info!(units = handles.len(), "Waiting for batch units to finish");
        let mut summary = BatchSummary::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => summary.outcomes.push(outcome),
                Err(err) => {
                    // A panicked unit is isolated; the batch still completes.
                    warn!(%err, "Batch unit aborted");
                }
            }
        }
        info!(
            scored = summary.scored(),
            failed = summary.failed(),
            "Batch run finished"
        );
        Ok(summary)
    }

    /// Fetches each family's events once, then merges the common family's
    /// events into every other family's list.
    async fn fetch_family_events(&self, window: &TimeWindow) -> HashMap<String, Vec<FaultEvent>> {
        let mut family_events: HashMap<String, Vec<FaultEvent>> = HashMap::new();
        for family in &self.properties.families {
            let events = match self
                .provider
                .events(
                    &self.properties.tags,
                    Some(&family.name),
                    None,
                    window.start_millis,
                    window.end_millis,
                )
                .await
            {
                Ok(events) => events,
                Err(err) => {
                    warn!(family = %family.name, %err, "Event fetch failed; family scored without events");
                    Vec::new()
                }
            };
            debug!(family = %family.name, count = events.len(), "Fetched family events");
            family_events.insert(family.name.clone(), events);
        }

        let common = family_events
            .get(COMMON_SERVICE_FAMILY)
            .cloned()
            .unwrap_or_default();
        if !common.is_empty() {
            for (family, events) in family_events.iter_mut() {
                if family != COMMON_SERVICE_FAMILY {
                    events.extend(common.iter().cloned());
                }
            }
        }
        family_events
    }

    fn spawn_unit(
        &self,
        service: Service,
        events: Vec<FaultEvent>,
        window: TimeWindow,
        metrics: ResiliencyMetricConfig,
        semaphore: Arc<Semaphore>,
    ) -> JoinHandle<ServiceOutcome> {
        let provider = self.provider.clone();
        let properties = self.properties.clone();
        let mode = self.mode;

        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => {
                    return ServiceOutcome {
                        family: service.family.clone(),
                        service_name: service.name.clone(),
                        score: None,
                        error: Some(err.to_string()),
                    }
                }
            };

            match mode {
                ScoringMode::Alert => {
                    score_alert_unit(provider, properties, service, events, window, metrics).await
                }
                ScoringMode::Success => {
                    score_success_unit(provider, properties, service, events, window, metrics).await
                }
            }
        })
    }
}

async fn score_alert_unit(
    provider: Arc<dyn MetricProvider>,
    properties: Arc<ResiliencyScoreProperties>,
    service: Service,
    events: Vec<FaultEvent>,
    window: TimeWindow,
    metrics: ResiliencyMetricConfig,
) -> ServiceOutcome {
    let events = filter_events(events, &window, false);
    if events.is_empty() {
        return ServiceOutcome {
            family: service.family.clone(),
            service_name: service.name.clone(),
            score: None,
            error: Some(
                ScoreError::NoEventsFound {
                    service: service.name.clone(),
                }
                .to_string(),
            ),
        };
    }
    if service.queries.is_empty() {
        return ServiceOutcome {
            family: service.family.clone(),
            service_name: service.name.clone(),
            score: None,
            error: Some(
                ScoreError::EmptyQueries {
                    service: service.name.clone(),
                }
                .to_string(),
            ),
        };
    }

    let scorer = AlertRatioScorer::new(provider.clone(), metrics.reference_window_minutes);
    let outcome = scorer.score(&service, &events).await;

    match outcome.score {
        Score::Valid(value) => {
            info!(service = %service.name, score = value, "Service scored");
            let metric = Metric::new(
                metrics.metric_name.clone(),
                value,
                Utc::now().timestamp_millis(),
                metric_tags(&properties, &service),
                metric_source(&properties),
            );
            if let Err(err) = provider.send_metric(&metric).await {
                warn!(service = %service.name, %err, "Failed to report resiliency metric");
            }
            ServiceOutcome {
                family: service.family,
                service_name: service.name,
                score: Some(value),
                error: None,
            }
        }
        Score::Invalid => ServiceOutcome {
            family: service.family,
            service_name: service.name,
            score: None,
            error: Some(outcome.message),
        },
    }
}

async fn score_success_unit(
    provider: Arc<dyn MetricProvider>,
    properties: Arc<ResiliencyScoreProperties>,
    service: Service,
    events: Vec<FaultEvent>,
    window: TimeWindow,
    metrics: ResiliencyMetricConfig,
) -> ServiceOutcome {
    // The success-ratio strategy only scores completed fault runs.
    let events = filter_events(events, &window, true);
    if events.is_empty() {
        return ServiceOutcome {
            family: service.family.clone(),
            service_name: service.name.clone(),
            score: None,
            error: Some(
                ScoreError::NoEventsFound {
                    service: service.name.clone(),
                }
                .to_string(),
            ),
        };
    }

    // run_all checked presence before spawning units
    let Some(success_config) = properties.success_ratio.clone() else {
        return ServiceOutcome {
            family: service.family.clone(),
            service_name: service.name.clone(),
            score: None,
            error: Some(ScoreError::SuccessRatioConfigMissing.to_string()),
        };
    };
    let endpoint_tag = success_config.endpoint_tag.clone();

    let scorer = SuccessRatioScorer::new(
        provider.clone(),
        success_config,
        properties.functional_split,
        metrics.reference_window_minutes,
        metrics.granularity,
    );
    let event_scores = scorer.score(&service, &events).await;

    let base_tags = metric_tags(&properties, &service);
    let source = metric_source(&properties);
    let mut emitted = Vec::new();
    for event_score in &event_scores {
        if !event_score.should_emit() {
            debug!(
                service = %service.name,
                event = %event_score.event_name,
                score = ?event_score.service_score,
                "Event score out of reporting range; not sent"
            );
            continue;
        }
        for metric in event_score.build_metrics(&metrics, &endpoint_tag, &base_tags, &source) {
            if let Err(err) = provider.send_metric(&metric).await {
                warn!(service = %service.name, metric = %metric.name, %err, "Failed to report metric");
            }
        }
        if let Some(score) = event_score.service_score {
            emitted.push(score);
        }
    }

    match mean(&emitted) {
        Some(score) => ServiceOutcome {
            family: service.family,
            service_name: service.name,
            score: Some(score),
            error: None,
        },
        None => ServiceOutcome {
            family: service.family,
            service_name: service.name,
            score: None,
            error: Some("no event produced a reportable score".to_string()),
        },
    }
}

fn metric_tags(
    properties: &ResiliencyScoreProperties,
    service: &Service,
) -> BTreeMap<String, String> {
    let mut tags = properties.merged_tags(&service.tags);
    tags.insert(SERVICE_TAG.to_string(), service.name.clone());
    tags.insert(SERVICE_FAMILY_TAG.to_string(), service.family.clone());
    tags
}

fn metric_source(properties: &ResiliencyScoreProperties) -> String {
    properties
        .provider
        .as_ref()
        .map(|connection| connection.source.clone())
        .unwrap_or_default()
}
