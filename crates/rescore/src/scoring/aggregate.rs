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

//! Weighted folding of accepted per-series ratios into one score.

use crate::models::Score;

/// Running weighted average over accepted contributions.
///
/// Every accepted paired series contributes its ratio times its query's
/// weight to the numerator and the weight itself to the denominator, so a
/// query whose condition returns several tagged series counts once per
/// accepted series.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAggregate {
    numerator: f64,
    denominator: f64,
}

impl WeightedAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ratio: f64, weight: f64) {
        self.numerator += ratio * weight;
        self.denominator += weight;
    }

    pub fn is_empty(&self) -> bool {
        self.denominator <= 0.0
    }

    /// Final score, or [`Score::Invalid`] when nothing contributed.
    pub fn finish(&self) -> Score {
        if self.is_empty() {
            return Score::Invalid;
        }
        Score::Valid(self.numerator / self.denominator)
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
