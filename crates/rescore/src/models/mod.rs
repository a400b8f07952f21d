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

//! Data model for the resiliency score engine.
//!
//! These types flow between the monitoring-backend boundary, the scoring
//! strategies, and the task store. Only [`ResiliencyScoreTask`] is persisted;
//! everything else lives for the duration of a single scoring run.

pub mod event;
pub mod metric;
pub mod score;
pub mod service;
pub mod task;
pub mod timeseries;

pub use event::FaultEvent;
pub use metric::Metric;
pub use score::{FaultEventScore, QueryResiliencyScore, Score, ServiceResiliencyScore};
pub use service::{Granularity, QueryDefinition, Service};
pub use task::{ResiliencyScoreTask, Schedule, TaskStatus, TaskTrigger};
pub use timeseries::TimeSeriesSample;
