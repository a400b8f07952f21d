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

//! Fault-injection events as recorded in the monitoring backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag key whose value carries the fault run's final state.
const DETAILS_TAG: &str = "details";

/// Marker inside the details tag set once a fault run finished.
const COMPLETED_MARKER: &str = "COMPLETED";

/// A recorded fault injection against one service.
///
/// Timestamps are epoch milliseconds with `start <= end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    pub name: String,
    pub start_millis: i64,
    pub end_millis: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl FaultEvent {
    /// True when the event is tagged as a completed fault run.
    ///
    /// The success-ratio strategy only scores completed runs; an aborted
    /// fault leaves no meaningful recovery window.
    pub fn is_completed(&self) -> bool {
        self.tags
            .get(DETAILS_TAG)
            .map(|details| details.contains(COMPLETED_MARKER))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_marker_is_read_from_details_tag() {
        let mut event = FaultEvent {
            name: "cpu-fault".to_string(),
            start_millis: 0,
            end_millis: 1,
            tags: BTreeMap::new(),
        };
        assert!(!event.is_completed());

        event
            .tags
            .insert("details".to_string(), "cpu-fault COMPLETED".to_string());
        assert!(event.is_completed());
    }
}
