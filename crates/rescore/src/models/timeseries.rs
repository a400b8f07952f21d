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

/// One tagged time series returned by a chart query.
///
/// The tag set identifies the logical series (host, shard, url, ...); the
/// points are (epoch-millis, value) pairs in backend order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub points: Vec<(i64, f64)>,
}

impl TimeSeriesSample {
    pub fn new(tags: BTreeMap<String, String>, points: Vec<(i64, f64)>) -> Self {
        Self { tags, points }
    }

    /// Sum of all point values; count queries encode their count this way.
    pub fn value_sum(&self) -> f64 {
        self.points.iter().map(|(_, value)| value).sum()
    }
}
