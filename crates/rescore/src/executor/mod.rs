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

//! Task execution.
//!
//! [`ScoreTaskExecutor`] drives the lifecycle of a single persisted scoring
//! run; [`BatchCoordinator`] fans independent runs out over every configured
//! service through a bounded worker pool. When a run should happen is not
//! decided here: scheduling is a collaborator reached through
//! [`ScheduleHandOff`].

mod batch;
mod task_executor;

pub use batch::{BatchCoordinator, BatchSummary, ScoringMode, ServiceOutcome};
pub use task_executor::{ScheduleHandOff, ScoreTaskExecutor};
