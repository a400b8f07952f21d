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
use rescore::executor::{BatchCoordinator, ScoringMode};
use rescore::provider::{ProviderRegistry, WAVEFRONT_PROVIDER};

pub async fn run(properties: Arc<ResiliencyScoreProperties>, mode: &str) -> Result<()> {
    let mode: ScoringMode = mode.parse().map_err(|message: String| anyhow!(message))?;
    let registry = ProviderRegistry::from_properties(&properties)?;
    let provider = registry.resolve(WAVEFRONT_PROVIDER)?;

    info!(?mode, "Starting batch scoring run");

    let coordinator = BatchCoordinator::new(provider, properties, mode);
    let summary = coordinator.run_all().await?;

    for outcome in &summary.outcomes {
        match (&outcome.score, &outcome.error) {
            (Some(score), _) => println!(
                "{}/{}: {:.4}",
                outcome.family, outcome.service_name, score
            ),
            (None, Some(error)) => println!(
                "{}/{}: failed ({})",
                outcome.family, outcome.service_name, error
            ),
            (None, None) => println!("{}/{}: no score", outcome.family, outcome.service_name),
        }
    }
    println!(
        "{} scored, {} failed",
        summary.scored(),
        summary.failed()
    );
    Ok(())
}
