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

//! Configuration for the resiliency score engine.
//!
//! Configuration is loaded once at startup into a [`ResiliencyScoreProperties`]
//! snapshot and treated as immutable thereafter: workers receive a shared
//! reference at submission time, and a reload means constructing a fresh
//! snapshot, never mutating the shared one.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    FamilyConfig, MetricProviderConnection, ResiliencyMetricConfig, ResiliencyScoreProperties,
    ServiceConfig, SuccessRatioConfig,
};
