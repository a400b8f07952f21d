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

//! Alert-ratio scoring: compares each alert-condition query's firing rate
//! before a fault against its firing rate after recovery.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{
    FaultEvent, FaultEventScore, QueryResiliencyScore, Score, Service, ServiceResiliencyScore,
    TimeSeriesSample,
};
use crate::provider::MetricProvider;

use super::aggregate::WeightedAggregate;
use super::window::{post_window, pre_window};

/// Extra fetch attempts when a chart query returns no series at all.
const QUERY_RETRY_COUNT: usize = 3;

pub const SCORE_SUCCESS_MESSAGE: &str = "Resiliency score calculated successfully";
pub const NO_SERIES_DATA_MESSAGE: &str =
    "no usable time-series data was returned for any query; resiliency score is invalid";

/// Result of one alert-ratio scoring run over a service's events.
#[derive(Debug, Clone)]
pub struct AlertRatioOutcome {
    pub score: Score,
    /// Per-event, per-query breakdown of accepted weighted contributions.
    pub breakdown: ServiceResiliencyScore,
    pub message: String,
}

/// Scores a service from its binary alert-condition queries.
///
/// For every fault event and query, the firing rate is computed over the
/// pre-fault baseline window and the post-recovery window separately. Series
/// are paired across the two windows by exact tag-set equality; both fetches
/// use the identical query string so the returned tag sets are comparable.
pub struct AlertRatioScorer {
    provider: Arc<dyn MetricProvider>,
    reference_window_minutes: i64,
}

impl AlertRatioScorer {
    pub fn new(provider: Arc<dyn MetricProvider>, reference_window_minutes: i64) -> Self {
        Self {
            provider,
            reference_window_minutes,
        }
    }

    /// Scores `service` over the given in-window fault events.
    ///
    /// Backend failures and unpaired or out-of-range series degrade the input
    /// set rather than failing the run; the score is [`Score::Invalid`] only
    /// when nothing at all contributed.
    pub async fn score(&self, service: &Service, events: &[FaultEvent]) -> AlertRatioOutcome {
        let mut aggregate = WeightedAggregate::new();
        let mut event_scores = Vec::with_capacity(events.len());

        for event in events {
            debug!(
                event = %event.name,
                start = event.start_millis,
                end = event.end_millis,
                "Scoring fault event"
            );
            let pre = pre_window(event, self.reference_window_minutes);
            let post = post_window(event, self.reference_window_minutes);

            let mut event_score = FaultEventScore {
                event_name: event.name.clone(),
                query_scores: BTreeMap::new(),
            };

            for query in &service.queries {
                let pre_series = self
                    .fetch_series(
                        &query.condition,
                        pre.start_millis,
                        pre.end_millis,
                        query.granularity,
                    )
                    .await;
                let post_series = self
                    .fetch_series(
                        &query.condition,
                        post.start_millis,
                        post.end_millis,
                        query.granularity,
                    )
                    .await;

                let pre_ratios = series_ratios(&pre_series);
                let post_ratios = series_ratios(&post_series);
                if pre_ratios.is_empty() || post_ratios.is_empty() {
                    warn!(
                        query = %query.condition,
                        event = %event.name,
                        "Missing pre or post window data; query skipped for this event"
                    );
                    continue;
                }

                let accepted = event_score
                    .query_scores
                    .entry(query.condition.clone())
                    .or_default();

                // Pair series across windows by exact tag-set equality.
                for (pre_tags, pre_ratio) in &pre_ratios {
                    for (post_tags, post_ratio) in &post_ratios {
                        if pre_tags != post_tags {
                            continue;
                        }
                        let ratio = paired_ratio(*pre_ratio, *post_ratio);
                        if !ratio.is_finite() || ratio > 1.0 {
                            debug!(ratio, "Out-of-range ratio rejected");
                            continue;
                        }
                        aggregate.add(ratio, query.weight);
                        accepted.push(QueryResiliencyScore {
                            tags: pre_tags.clone(),
                            score: ratio,
                        });
                    }
                }
            }
            event_scores.push(event_score);
        }

        let score = aggregate.finish();
        let message = if score.is_valid() {
            SCORE_SUCCESS_MESSAGE.to_string()
        } else {
            NO_SERIES_DATA_MESSAGE.to_string()
        };

        AlertRatioOutcome {
            score,
            breakdown: ServiceResiliencyScore {
                service_name: service.name.clone(),
                events: event_scores,
            },
            message,
        }
    }

    /// Fetches a window's series, retrying when the backend returns none.
    ///
    /// A failed call drops this fetch's data from the aggregation; the run
    /// continues on whatever the other calls produced.
    async fn fetch_series(
        &self,
        condition: &str,
        start_millis: i64,
        end_millis: i64,
        granularity: crate::models::Granularity,
    ) -> Vec<TimeSeriesSample> {
        for attempt in 0..=QUERY_RETRY_COUNT {
            match self
                .provider
                .time_series(condition, start_millis, end_millis, granularity)
                .await
            {
                Ok(series) if !series.is_empty() => return series,
                Ok(_) => {
                    debug!(query = %condition, attempt, "Query returned no series; retrying");
                }
                Err(error) => {
                    warn!(query = %condition, %error, "Time-series fetch failed; data excluded");
                    return Vec::new();
                }
            }
        }
        warn!(query = %condition, "Query returned no series after retries");
        Vec::new()
    }
}

/// Alert firing rate for each non-empty series, keyed by its tag set.
fn series_ratios(series: &[TimeSeriesSample]) -> Vec<(BTreeMap<String, String>, f64)> {
    series
        .iter()
        .filter(|sample| !sample.points.is_empty())
        .map(|sample| (sample.tags.clone(), raw_ratio(&sample.points)))
        .collect()
}

/// Fraction of samples where the alert fired.
///
/// A raw ratio of exactly 0 is replaced by 1.0: the backend's "no alert
/// fired" case is treated as a perfect score. Downstream dashboards depend
/// on this exact rule; keep it.
fn raw_ratio(points: &[(i64, f64)]) -> f64 {
    let fired = points.iter().filter(|(_, value)| *value == 1.0).count();
    let ratio = fired as f64 / points.len() as f64;
    if ratio == 0.0 {
        1.0
    } else {
        ratio
    }
}

/// Ratio of the smaller firing rate to the larger one: 1.0 means the two
/// windows looked alike, lower means they diverged. Symmetric in its
/// arguments; 0 whenever either side is 0.
fn paired_ratio(pre_ratio: f64, post_ratio: f64) -> f64 {
    if pre_ratio == 0.0 || post_ratio == 0.0 {
        return 0.0;
    }
    pre_ratio.min(post_ratio) / pre_ratio.max(post_ratio)
}
