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

//! Window derivation and the two scoring strategies.
//!
//! [`window`] contains the pure time-window arithmetic. [`alert_ratio`]
//! scores a service from binary alert-condition queries; [`success_ratio`]
//! scores from per-endpoint success/total request counts. Both feed
//! [`aggregate`] for their weighted folding.
//!
//! The two strategies resolve an out-of-range ratio differently: alert-ratio
//! discards the sample, success-ratio clamps it to 1. These are deliberate
//! per-mode policies and must not be unified.

pub mod aggregate;
pub mod alert_ratio;
pub mod success_ratio;
pub mod window;

pub use aggregate::WeightedAggregate;
pub use alert_ratio::{AlertRatioOutcome, AlertRatioScorer};
pub use success_ratio::{EndpointScore, EventSuccessScore, SuccessRatioScorer};
pub use window::TimeWindow;
