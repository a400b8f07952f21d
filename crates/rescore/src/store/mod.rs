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

//! The task persistence boundary.
//!
//! The engine only needs keyed get/save plus one atomic result update; any
//! real database sits behind [`TaskStore`]. [`MemoryTaskStore`] is the
//! in-process implementation used by the CLI and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{ResiliencyScoreTask, Score, TaskStatus};

/// Keyed persistence for [`ResiliencyScoreTask`] records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<ResiliencyScoreTask>, StoreError>;

    /// Inserts or replaces the whole task record.
    async fn save(&self, task: &ResiliencyScoreTask) -> Result<(), StoreError>;

    /// Applies a run's outcome to the task's current trigger.
    ///
    /// Status, score and end time must land together: concurrent triggers of
    /// the same task id may race on this update, and last-writer-wins is
    /// acceptable only as long as the three fields stay consistent with each
    /// other.
    async fn update_result(
        &self,
        id: &str,
        status: TaskStatus,
        score: Score,
        end_time: Option<DateTime<Utc>>,
        message: Option<String>,
    ) -> Result<(), StoreError>;
}

/// In-memory [`TaskStore`] backed by a read-write lock.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, ResiliencyScoreTask>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get(&self, id: &str) -> Result<Option<ResiliencyScoreTask>, StoreError> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn save(&self, task: &ResiliencyScoreTask) -> Result<(), StoreError> {
        debug!(task_id = %task.id, service = %task.service_name, "Saving task");
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update_result(
        &self,
        id: &str,
        status: TaskStatus,
        score: Score,
        end_time: Option<DateTime<Utc>>,
        message: Option<String>,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| StoreError::NotFound {
            id: id.to_string(),
        })?;

        // The write lock is held across all three fields, so readers never
        // observe a partially applied result.
        let last_updated = end_time.unwrap_or_else(Utc::now);
        if let Some(trigger) = task.current_trigger_mut() {
            trigger.status = status;
            trigger.score = score;
            trigger.end_time = end_time;
            trigger.status_message = message;
        }
        task.last_updated = last_updated;
        debug!(task_id = %id, ?status, "Applied task result");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_test_logging;

    #[tokio::test]
    async fn save_then_get_round_trips() {
        init_test_logging();

        let store = MemoryTaskStore::new();
        let task = ResiliencyScoreTask::new("payments");
        store.save(&task).await.unwrap();

        let loaded = store.get(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.service_name, "payments");
    }

    #[tokio::test]
    async fn result_update_lands_as_one_unit() {
        init_test_logging();

        let store = MemoryTaskStore::new();
        let mut task = ResiliencyScoreTask::new("payments");
        task.push_trigger(Utc::now());
        store.save(&task).await.unwrap();

        let finished = Utc::now();
        store
            .update_result(
                &task.id,
                TaskStatus::Completed,
                Score::Valid(0.8),
                Some(finished),
                Some("done".to_string()),
            )
            .await
            .unwrap();

        let loaded = store.get(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.status(), TaskStatus::Completed);
        assert_eq!(loaded.score(), Score::Valid(0.8));
        assert_eq!(loaded.current_trigger().unwrap().end_time, Some(finished));
        assert_eq!(loaded.status_message(), Some("done"));
    }

    #[tokio::test]
    async fn updating_a_missing_task_is_an_error() {
        init_test_logging();

        let store = MemoryTaskStore::new();
        let result = store
            .update_result("missing", TaskStatus::Failed, Score::Invalid, None, None)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
