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

//! The monitoring-backend boundary.
//!
//! Everything the engine needs from a backend is expressed by the
//! [`MetricProvider`] trait: fault events in, time series in, computed
//! metrics out. Scoring and execution code only ever sees the trait, so a
//! different backend (or a test fake) slots in without touching them.

mod registry;
mod wavefront;

pub use registry::{ProviderRegistry, WAVEFRONT_PROVIDER};
pub use wavefront::WavefrontProvider;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{FaultEvent, Granularity, Metric, TimeSeriesSample};

/// A monitoring backend the engine reads from and reports to.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Fault events recorded between `start_millis` and `end_millis`.
    ///
    /// `tags` narrows to events carrying every given tag; `family` and
    /// `service` narrow by the owning service family and service when set.
    async fn events(
        &self,
        tags: &BTreeMap<String, String>,
        family: Option<&str>,
        service: Option<&str>,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<FaultEvent>, ProviderError>;

    /// Evaluates a chart query over `[start_millis, end_millis]` and returns
    /// every tagged series the backend produced for it.
    async fn time_series(
        &self,
        query: &str,
        start_millis: i64,
        end_millis: i64,
        granularity: Granularity,
    ) -> Result<Vec<TimeSeriesSample>, ProviderError>;

    /// Reports a computed metric point back to the backend.
    async fn send_metric(&self, metric: &Metric) -> Result<(), ProviderError>;
}
