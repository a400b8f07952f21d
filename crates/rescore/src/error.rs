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

//! Error types for the resiliency score engine.
//!
//! The taxonomy mirrors how failures propagate at runtime:
//!
//! - [`ProviderError`] - a single monitoring-backend call failed. These
//!   degrade the input set (the affected series or endpoint is dropped from
//!   aggregation) and never fail a task on their own.
//! - [`ScoreError`] - a task-level failure. Caught at the executor boundary
//!   and converted into a persisted `Failed` status; never propagated out of
//!   the batch coordinator.
//! - [`StoreError`] - the persistence boundary failed.
//! - [`ConfigError`] - the configuration snapshot could not be loaded or
//!   failed validation at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from a single call to the monitoring backend.
///
/// Per-call failures are logged and swallowed at the scoring layer: the data
/// that call would have contributed is simply excluded from aggregation.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request to monitoring backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("monitoring backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode monitoring backend response: {message}")]
    Decode { message: String },

    #[error("no provider registered under name '{name}'")]
    UnknownProvider { name: String },

    #[error("no metric provider connection is configured")]
    NotConfigured,
}

/// Task-level errors raised while executing one scoring run.
///
/// The executor catches every variant, persists a `Failed` status with the
/// error's message, and returns normally to its caller.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("no active metric provider is configured; resiliency score cannot be calculated")]
    ProviderConfigMissing,

    #[error("no resiliency metric configuration found; resiliency score cannot be calculated")]
    MetricConfigMissing,

    #[error("no task found with id '{id}'")]
    TaskNotFound { id: String },

    #[error("no service found with name '{name}'")]
    ServiceNotFound { name: String },

    #[error("no queries are associated with service '{service}'")]
    EmptyQueries { service: String },

    #[error("no fault injection events found for service '{service}' within the scoring window")]
    NoEventsFound { service: String },

    #[error("success-ratio scoring requested but no success-ratio configuration exists")]
    SuccessRatioConfigMissing,

    #[error("schedule hand-off requested but no scheduler is configured")]
    SchedulerUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors from the task persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("task '{id}' does not exist")]
    NotFound { id: String },

    #[error("task store backend failed: {message}")]
    Backend { message: String },
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found in any search location")]
    ConfigNotFound,

    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("environment variable substitution failed: {0}")]
    EnvSubstitutionError(String),

    #[error("invalid query weight {weight} for query '{query}' (must be >= 0)")]
    InvalidWeight { query: String, weight: f64 },

    #[error("invalid functional split {alpha} (must be within [0, 1])")]
    InvalidFunctionalSplit { alpha: f64 },

    #[error("invalid {field}: {value} (must be positive)")]
    InvalidWindow { field: &'static str, value: i64 },

    #[error("invalid granularity '{value}' (must be one of: s, m, h, d)")]
    InvalidGranularity { value: String },
}
