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

//! Resiliency score values and the per-run breakdown attached to a task.
//!
//! Internally a score is a tagged value: either a valid number in `[0, 1]`
//! or explicitly invalid. Persistence stores and downstream dashboards expect
//! a scalar, so the invalid case serializes to the `-1.0` sentinel at the
//! boundary and nowhere else.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Scalar persisted in place of an invalid score.
pub const INVALID_SCORE_SENTINEL: f64 = -1.0;

/// Outcome of a scoring computation.
///
/// `Valid` carries a value in `[0, 1]`; `Invalid` means no usable data was
/// available (for example no fault events fell inside the lookback window, or
/// every candidate series was rejected).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Valid(f64),
    Invalid,
}

impl Score {
    pub fn is_valid(&self) -> bool {
        matches!(self, Score::Valid(_))
    }

    /// Scalar form for the persistence and metric boundaries.
    pub fn to_sentinel(&self) -> f64 {
        match self {
            Score::Valid(value) => *value,
            Score::Invalid => INVALID_SCORE_SENTINEL,
        }
    }

    /// Reconstructs a score from its persisted scalar form.
    ///
    /// Anything outside `[0, 1]` is treated as the invalid sentinel; stored
    /// scores are never silently clamped back into range.
    pub fn from_sentinel(value: f64) -> Self {
        if (0.0..=1.0).contains(&value) {
            Score::Valid(value)
        } else {
            Score::Invalid
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_sentinel())
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Score::from_sentinel(value))
    }
}

/// Score of one tagged time series over one window pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResiliencyScore {
    /// Tag set identifying the logical series (host, shard, ...).
    pub tags: BTreeMap<String, String>,
    /// Accepted ratio in `[0, 1]` for this series.
    pub score: f64,
}

/// Per-event breakdown of accepted series scores, keyed by query condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultEventScore {
    /// Name of the fault injection event this breakdown belongs to.
    pub event_name: String,
    /// Accepted series scores per query condition.
    pub query_scores: BTreeMap<String, Vec<QueryResiliencyScore>>,
}

/// Full breakdown persisted next to the task on a successful run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceResiliencyScore {
    pub service_name: String,
    pub events: Vec<FaultEventScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_round_trip() {
        assert_eq!(Score::Valid(0.5).to_sentinel(), 0.5);
        assert_eq!(Score::Invalid.to_sentinel(), INVALID_SCORE_SENTINEL);
        assert_eq!(Score::from_sentinel(0.5), Score::Valid(0.5));
        assert_eq!(Score::from_sentinel(-1.0), Score::Invalid);
    }

    #[test]
    fn out_of_range_scalar_is_invalid() {
        assert_eq!(Score::from_sentinel(1.5), Score::Invalid);
        assert_eq!(Score::from_sentinel(f64::NAN), Score::Invalid);
    }

    #[test]
    fn serializes_as_scalar() {
        let json = serde_json::to_string(&Score::Invalid).unwrap();
        assert_eq!(json, "-1.0");
        let back: Score = serde_json::from_str("0.25").unwrap();
        assert_eq!(back, Score::Valid(0.25));
    }
}
