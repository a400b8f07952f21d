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

//! Resiliency Score Task Model
//!
//! A task records one service's scoring runs. Each external trigger (API
//! call, scheduler firing, batch sweep) pushes a new [`TaskTrigger`] onto the
//! task's history; the newest trigger is authoritative for status and score.
//! Tasks are created by callers, mutated by the executor, and never deleted
//! by this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::score::Score;

/// Lifecycle state of one scoring run.
///
/// `Created -> InProgress -> {Completed, Failed}`; the two terminal states
/// are never left once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Created,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Optional scheduling request carried on a task.
///
/// The engine never interprets this beyond handing it to an external
/// scheduler collaborator; exactly one of the two fields is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub cron_expression: Option<String>,
    pub fixed_delay_millis: Option<u64>,
}

/// One entry in a task's trigger history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTrigger {
    /// Current status of this run.
    pub status: TaskStatus,
    /// Score computed by this run; serialized as the `-1.0` sentinel while
    /// unset or invalid.
    pub score: Score,
    /// Human-readable outcome description.
    pub status_message: Option<String>,
    /// When this run was triggered.
    pub start_time: DateTime<Utc>,
    /// When this run reached a terminal state.
    pub end_time: Option<DateTime<Utc>>,
}

impl TaskTrigger {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Created,
            score: Score::Invalid,
            status_message: None,
            start_time,
            end_time: None,
        }
    }
}

/// A persisted resiliency scoring task for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResiliencyScoreTask {
    /// Unique identifier, assigned at creation.
    pub id: String,
    /// Name of the service this task scores.
    pub service_name: String,
    /// Whether this task has been handed to an external scheduler.
    pub scheduled: bool,
    /// Optional schedule request, interpreted by the external scheduler.
    pub schedule: Option<Schedule>,
    /// Ordered trigger history; the last entry is the current run.
    pub triggers: Vec<TaskTrigger>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl ResiliencyScoreTask {
    pub fn new(service_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            service_name: service_name.into(),
            scheduled: false,
            schedule: None,
            triggers: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Current run, if any trigger has been recorded.
    pub fn current_trigger(&self) -> Option<&TaskTrigger> {
        self.triggers.last()
    }

    pub fn current_trigger_mut(&mut self) -> Option<&mut TaskTrigger> {
        self.triggers.last_mut()
    }

    /// Status of the newest trigger; `Created` before the first run.
    pub fn status(&self) -> TaskStatus {
        self.current_trigger()
            .map(|trigger| trigger.status)
            .unwrap_or(TaskStatus::Created)
    }

    /// Score of the newest trigger.
    pub fn score(&self) -> Score {
        self.current_trigger()
            .map(|trigger| trigger.score)
            .unwrap_or(Score::Invalid)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.current_trigger()
            .and_then(|trigger| trigger.status_message.as_deref())
    }

    /// Opens a new trigger for a fresh run.
    pub fn push_trigger(&mut self, start_time: DateTime<Utc>) {
        self.triggers.push(TaskTrigger::new(start_time));
        self.last_updated = start_time;
    }
}
