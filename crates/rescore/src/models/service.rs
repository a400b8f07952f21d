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

//! Monitored services and the alert-condition queries attached to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sampling granularity for time-series queries.
///
/// Wire codes follow the monitoring backend's chart API: `s`, `m`, `h`, `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Granularity {
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "m")]
    #[default]
    Minute,
    #[serde(rename = "h")]
    Hour,
    #[serde(rename = "d")]
    Day,
}

impl Granularity {
    pub fn as_wire_code(&self) -> &'static str {
        match self {
            Granularity::Second => "s",
            Granularity::Minute => "m",
            Granularity::Hour => "h",
            Granularity::Day => "d",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_code())
    }
}

/// An alert-condition query evaluated against the monitoring backend.
///
/// The condition must evaluate to a binary (0/1) series: `1` means the
/// defined health condition was breached at that sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefinition {
    /// Name used for collision resolution between family-common and
    /// service-specific query sets.
    pub name: String,
    /// The alert-condition expression the backend evaluates.
    pub condition: String,
    /// Relative weight of this query in the aggregate score. Must be >= 0.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Sampling granularity for the pre/post window fetches.
    #[serde(default)]
    pub granularity: Granularity,
}

fn default_weight() -> f64 {
    1.0
}

/// A monitored service within a service family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Owning service-family name.
    pub family: String,
    /// Tags attached to every metric emitted for this service.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Resolved query set: family-common queries with service-specific
    /// overrides already applied.
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
}

impl Service {
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            tags: BTreeMap::new(),
            queries: Vec::new(),
        }
    }
}

/// Builds the effective query set for one service.
///
/// The result is the union of the family-common queries and the
/// service-specific queries, preserved in encounter order. On a name
/// collision the service-specific definition replaces the common one in
/// place; duplicates within either list are kept as encountered.
pub fn resolve_queries(
    common: &[QueryDefinition],
    service_specific: &[QueryDefinition],
) -> Vec<QueryDefinition> {
    let mut resolved: Vec<QueryDefinition> = common.to_vec();
    for query in service_specific {
        match resolved.iter_mut().find(|q| q.name == query.name) {
            Some(existing) => *existing = query.clone(),
            None => resolved.push(query.clone()),
        }
    }
    resolved
}
