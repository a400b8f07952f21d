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

//! Pure time-window arithmetic. No side effects anywhere in this module.

use crate::models::FaultEvent;

const MILLIS_PER_MINUTE: i64 = 60 * 1000;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// A closed time interval in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl TimeWindow {
    pub fn new(start_millis: i64, end_millis: i64) -> Self {
        Self {
            start_millis,
            end_millis,
        }
    }

    pub fn contains(&self, instant_millis: i64) -> bool {
        instant_millis >= self.start_millis && instant_millis <= self.end_millis
    }
}

/// The overall lookback window ending at `now_millis`.
pub fn overall_window(now_millis: i64, lookback_hours: i64) -> TimeWindow {
    TimeWindow::new(now_millis - lookback_hours * MILLIS_PER_HOUR, now_millis)
}

/// Baseline window: the reference minutes leading up to the fault start.
pub fn pre_window(event: &FaultEvent, reference_window_minutes: i64) -> TimeWindow {
    TimeWindow::new(
        event.start_millis - reference_window_minutes * MILLIS_PER_MINUTE,
        event.start_millis,
    )
}

/// Recovery window: the reference minutes following the fault end.
pub fn post_window(event: &FaultEvent, reference_window_minutes: i64) -> TimeWindow {
    TimeWindow::new(
        event.end_millis,
        event.end_millis + reference_window_minutes * MILLIS_PER_MINUTE,
    )
}

/// Keeps the events whose end falls inside `window`.
///
/// With `completed_only` set, events not tagged as completed fault runs are
/// dropped as well. Events falling outside the window are expected during
/// normal operation, not an error.
pub fn filter_events(
    events: Vec<FaultEvent>,
    window: &TimeWindow,
    completed_only: bool,
) -> Vec<FaultEvent> {
    events
        .into_iter()
        .filter(|event| window.contains(event.end_millis))
        .filter(|event| !completed_only || event.is_completed())
        .collect()
}
