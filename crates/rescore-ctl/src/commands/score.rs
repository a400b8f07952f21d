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

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use rescore::config::ResiliencyScoreProperties;
use rescore::executor::ScoreTaskExecutor;
use rescore::models::ResiliencyScoreTask;
use rescore::provider::{ProviderRegistry, WAVEFRONT_PROVIDER};
use rescore::store::{MemoryTaskStore, TaskStore};

pub async fn run(properties: Arc<ResiliencyScoreProperties>, service: &str) -> Result<()> {
    let registry = ProviderRegistry::from_properties(&properties)?;
    let provider = registry.resolve(WAVEFRONT_PROVIDER)?;
    let store = Arc::new(MemoryTaskStore::new());
    let executor = ScoreTaskExecutor::new(provider, store.clone(), properties);

    let task = ResiliencyScoreTask::new(service);
    info!(service, task_id = %task.id, "Scoring service");
    store.save(&task).await?;
    executor.run(&task.id).await?;

    let finished = store
        .get(&task.id)
        .await?
        .ok_or_else(|| anyhow!("task '{}' disappeared from the store", task.id))?;
    println!("{}", serde_json::to_string_pretty(&finished)?);
    Ok(())
}
