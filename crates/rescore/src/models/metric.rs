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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A computed metric sent back to the monitoring backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub timestamp_millis: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Source host/application reported with the point.
    pub source: String,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        timestamp_millis: i64,
        tags: BTreeMap<String, String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp_millis,
            tags,
            source: source.into(),
        }
    }
}
