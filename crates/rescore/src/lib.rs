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

//! # Rescore
//!
//! Rescore is a resiliency scoring engine for chaos-engineering experiments.
//! Given a recorded fault-injection event and a window of monitoring data, it
//! computes a normalized measure of how well a service's health metrics
//! recovered relative to their pre-fault baseline, aggregates that measure
//! across multiple monitored signals with configurable weights, and runs the
//! computation concurrently across many services while tolerating backend and
//! data failures.
//!
//! ## Architecture
//!
//! - [`provider`] - the monitoring-backend boundary: fault events in, time
//!   series in, computed metrics out
//! - [`scoring`] - window derivation and the two scoring strategies
//!   (alert-ratio and success-ratio) plus weighted aggregation
//! - [`executor`] - the task lifecycle for a single scoring run and the
//!   batch coordinator that fans runs out over many services
//! - [`store`] - the persistence boundary for [`ResiliencyScoreTask`] records
//! - [`config`] - the immutable configuration snapshot loaded at startup
//!
//! ## Scoring model
//!
//! A fault injection is bracketed by two reference windows: the minutes just
//! before the fault started (baseline) and the minutes just after it ended
//! (recovery). Each monitored alert-condition query is evaluated over both
//! windows; the ratio of the two alert rates, weighted per query, yields a
//! score in `[0, 1]` where `1.0` means no observable degradation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rescore::config::ResiliencyScoreProperties;
//! use rescore::executor::ScoreTaskExecutor;
//! use rescore::provider::WavefrontProvider;
//! use rescore::store::{MemoryTaskStore, TaskStore};
//! use rescore::ResiliencyScoreTask;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let properties = Arc::new(ResiliencyScoreProperties::from_file("rescore.toml")?);
//! let provider = Arc::new(WavefrontProvider::from_properties(&properties)?);
//! let store = Arc::new(MemoryTaskStore::new());
//!
//! let executor = ScoreTaskExecutor::new(provider, store.clone(), properties);
//! let task = ResiliencyScoreTask::new("payment-service");
//! store.save(&task).await?;
//! executor.run(&task.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod provider;
pub mod scoring;
pub mod store;

// Re-export commonly used types
pub use config::ResiliencyScoreProperties;
pub use error::{ConfigError, ProviderError, ScoreError, StoreError};
pub use executor::{BatchCoordinator, ScoreTaskExecutor, ScoringMode};
pub use models::{
    FaultEvent, Granularity, Metric, QueryDefinition, ResiliencyScoreTask, Score, Service,
    TaskStatus, TimeSeriesSample,
};
pub use provider::{MetricProvider, ProviderRegistry, WavefrontProvider};
pub use store::{MemoryTaskStore, TaskStore};

/// Service family whose fault events apply to every other family.
///
/// Faults injected against shared infrastructure are recorded under this
/// family; the batch coordinator merges its events into each family's event
/// list before scoring.
pub const COMMON_SERVICE_FAMILY: &str = "common";

/// Initializes logging for tests.
///
/// Safe to call from every test; the subscriber is installed once. Honors
/// `RUST_LOG` so individual runs can turn up verbosity.
pub fn init_test_logging() {
    use once_cell::sync::OnceCell;
    static INIT: OnceCell<()> = OnceCell::new();

    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
