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

//! Lifecycle of a single scoring run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::ResiliencyScoreProperties;
use crate::error::ScoreError;
use crate::models::{Metric, ResiliencyScoreTask, Score, TaskStatus};
use crate::provider::MetricProvider;
use crate::scoring::alert_ratio::AlertRatioScorer;
use crate::scoring::window::{filter_events, overall_window};
use crate::store::TaskStore;

/// Tag key carrying the scored service's name on the emitted metric.
pub(crate) const SERVICE_TAG: &str = "service";

/// External scheduler collaborator.
///
/// The executor hands a task over and never looks at the schedule again;
/// cron/interval interpretation happens entirely outside the engine.
#[async_trait]
pub trait ScheduleHandOff: Send + Sync {
    async fn schedule(&self, task: &ResiliencyScoreTask) -> Result<(), ScoreError>;
}

/// Executes one scoring run per call against a persisted task.
///
/// Every failure mode inside a run is caught and persisted as a `Failed`
/// status with a descriptive message; [`run`](Self::run) only returns an
/// error when the task itself cannot be loaded or its result cannot be
/// stored.
pub struct ScoreTaskExecutor {
    provider: Arc<dyn MetricProvider>,
    store: Arc<dyn TaskStore>,
    properties: Arc<ResiliencyScoreProperties>,
    scheduler: Option<Arc<dyn ScheduleHandOff>>,
}

impl ScoreTaskExecutor {
    pub fn new(
        provider: Arc<dyn MetricProvider>,
        store: Arc<dyn TaskStore>,
        properties: Arc<ResiliencyScoreProperties>,
    ) -> Self {
        Self {
            provider,
            store,
            properties,
            scheduler: None,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn ScheduleHandOff>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Submits a task: scheduled tasks are handed off, the rest run now.
    pub async fn submit(&self, task: &ResiliencyScoreTask) -> Result<(), ScoreError> {
        if task.schedule.is_some() {
            let scheduler = self
                .scheduler
                .as_ref()
                .ok_or(ScoreError::SchedulerUnavailable)?;
            scheduler.schedule(task).await?;

            let mut scheduled = task.clone();
            scheduled.scheduled = true;
            scheduled.last_updated = Utc::now();
            self.store.save(&scheduled).await?;
            info!(task_id = %task.id, "Task handed off to scheduler");
            return Ok(());
        }
        self.run(&task.id).await
    }

    /// Runs one scoring trigger for the task with the given id.
    pub async fn run(&self, task_id: &str) -> Result<(), ScoreError> {
        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or_else(|| ScoreError::TaskNotFound {
                id: task_id.to_string(),
            })?;

        task.push_trigger(Utc::now());
        self.store.save(&task).await?;

        match self.execute(&task).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // A failed run is an outcome, not an error to the caller.
                error!(task_id = %task.id, service = %task.service_name, %err, "Scoring run failed");
                self.store
                    .update_result(
                        &task.id,
                        TaskStatus::Failed,
                        Score::Invalid,
                        Some(Utc::now()),
                        Some(err.to_string()),
                    )
                    .await?;
                Ok(())
            }
        }
    }

    async fn execute(&self, task: &ResiliencyScoreTask) -> Result<(), ScoreError> {
        if self.properties.provider.is_none() {
            return Err(ScoreError::ProviderConfigMissing);
        }
        let metrics = self
            .properties
            .metrics
            .as_ref()
            .ok_or(ScoreError::MetricConfigMissing)?;

        let service = self
            .properties
            .find_service(&task.service_name)
            .ok_or_else(|| ScoreError::ServiceNotFound {
                name: task.service_name.clone(),
            })?;
        if service.queries.is_empty() {
            return Err(ScoreError::EmptyQueries {
                service: service.name.clone(),
            });
        }

        self.store
            .update_result(&task.id, TaskStatus::InProgress, Score::Invalid, None, None)
            .await?;
        info!(task_id = %task.id, service = %service.name, "Calculating resiliency score");

        let now_millis = Utc::now().timestamp_millis();
        let window = overall_window(now_millis, metrics.lookback_hours);
        let tags = self.properties.merged_tags(&service.tags);

        let events = match self
            .provider
            .events(&tags, None, None, window.start_millis, window.end_millis)
            .await
        {
            Ok(events) => events,
            Err(err) => {
                warn!(service = %service.name, %err, "Event fetch failed");
                Vec::new()
            }
        };
        let events = filter_events(events, &window, false);
        if events.is_empty() {
            return Err(ScoreError::NoEventsFound {
                service: service.name.clone(),
            });
        }

        let scorer = AlertRatioScorer::new(self.provider.clone(), metrics.reference_window_minutes);
        let outcome = scorer.score(&service, &events).await;

        let end_time = Utc::now();
        match outcome.score {
            Score::Valid(value) => {
                info!(task_id = %task.id, service = %service.name, score = value, "Resiliency score calculated");
                self.store
                    .update_result(
                        &task.id,
                        TaskStatus::Completed,
                        outcome.score,
                        Some(end_time),
                        Some(outcome.message),
                    )
                    .await?;

                let mut metric_tags = tags;
                metric_tags.insert(SERVICE_TAG.to_string(), service.name.clone());
                let source = self
                    .properties
                    .provider
                    .as_ref()
                    .map(|connection| connection.source.clone())
                    .unwrap_or_default();
                let metric = Metric::new(
                    metrics.metric_name.clone(),
                    value,
                    end_time.timestamp_millis(),
                    metric_tags,
                    source,
                );
                if let Err(err) = self.provider.send_metric(&metric).await {
                    // The score is already persisted; the point is lost, not the run.
                    warn!(task_id = %task.id, %err, "Failed to report resiliency metric");
                }
                Ok(())
            }
            Score::Invalid => {
                self.store
                    .update_result(
                        &task.id,
                        TaskStatus::Failed,
                        Score::Invalid,
                        Some(end_time),
                        Some(outcome.message),
                    )
                    .await?;
                Ok(())
            }
        }
    }
}
