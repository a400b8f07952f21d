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

//! Tests for the batch coordinator's fan-out, isolation and join behavior.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rescore::executor::{BatchCoordinator, ScoringMode};
use rescore::init_test_logging;

use crate::fixtures::{
    family, post_start, pre_start, properties, query, recent_event, service_config, FakeProvider,
};

/// Registers an identical healthy pre/post pair so the service scores 1.0.
fn healthy_series(provider: FakeProvider, condition: &str, event: &rescore::models::FaultEvent) -> FakeProvider {
    provider
        .with_series(condition, pre_start(event), &[], &[1.0, 0.0, 0.0, 0.0])
        .with_series(condition, post_start(event), &[], &[1.0, 0.0, 0.0, 0.0])
}

#[tokio::test]
async fn one_failing_service_does_not_sink_the_batch() {
    init_test_logging();

    let event = recent_event("cpu-fault");
    let mut provider = FakeProvider::new();
    for name in ["svc1", "svc2", "svc3", "svc4", "svc5"] {
        provider = provider.with_event(Some("checkout"), event.clone());
        let condition = format!("alert:{}", name);
        if name == "svc3" {
            provider = provider.with_failing_query(&condition);
        } else {
            provider = healthy_series(provider, &condition, &event);
        }
    }

    let services = ["svc1", "svc2", "svc3", "svc4", "svc5"]
        .iter()
        .map(|name| service_config(name, vec![query(&format!("alert:{}", name), 1.0)]))
        .collect();
    let props = properties(vec![family("checkout", services)]);

    let coordinator = BatchCoordinator::new(
        Arc::new(provider),
        Arc::new(props),
        ScoringMode::Alert,
    );
    let summary = coordinator.run_all().await.unwrap();

    assert_eq!(summary.outcomes.len(), 5);
    assert_eq!(summary.scored(), 4);
    assert_eq!(summary.failed(), 1);

    let failed = summary
        .outcomes
        .iter()
        .find(|outcome| outcome.score.is_none())
        .unwrap();
    assert_eq!(failed.service_name, "svc3");
    assert!(failed.error.is_some());
}

#[tokio::test]
async fn common_family_events_apply_to_every_family() {
    init_test_logging();

    // the only event lives under the common family; checkout has none of its own
    let event = recent_event("shared-infra-fault");
    let provider = FakeProvider::new().with_event(Some("common"), event.clone());
    let provider = healthy_series(provider, "alert:cart", &event);

    let props = properties(vec![
        family("common", Vec::new()),
        family(
            "checkout",
            vec![service_config("cart", vec![query("alert:cart", 1.0)])],
        ),
    ]);

    let coordinator = BatchCoordinator::new(
        Arc::new(provider),
        Arc::new(props),
        ScoringMode::Alert,
    );
    let summary = coordinator.run_all().await.unwrap();

    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].service_name, "cart");
    assert_eq!(summary.outcomes[0].score, Some(1.0));
}

#[tokio::test]
async fn worker_pool_respects_the_concurrency_bound() {
    init_test_logging();

    let event = recent_event("cpu-fault");
    let mut provider = FakeProvider::new().with_event(Some("checkout"), event.clone());
    let mut services = Vec::new();
    for i in 0..8 {
        let condition = format!("alert:svc{}", i);
        provider = healthy_series(provider, &condition, &event);
        services.push(service_config(&format!("svc{}", i), vec![query(&condition, 1.0)]));
    }

    let mut props = properties(vec![family("checkout", services)]);
    props.max_concurrent_services = 2;

    let provider = Arc::new(provider);
    let coordinator = BatchCoordinator::new(provider.clone(), Arc::new(props), ScoringMode::Alert);
    let summary = coordinator.run_all().await.unwrap();

    assert_eq!(summary.scored(), 8);
    // fetches only happen while a unit holds a pool permit
    assert!(provider.max_active_fetches.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn success_mode_scores_endpoints_per_event() {
    init_test_logging();

    // /a: pre 9/10 = 0.9, post 4.5/10 = 0.45 -> resiliency 0.5
    let event = recent_event("cpu-fault");
    let provider = FakeProvider::new()
        .with_event(Some("checkout"), event.clone())
        .with_series("total:cart", pre_start(&event), &[("url", "/a")], &[10.0])
        .with_series("success:cart", pre_start(&event), &[("url", "/a")], &[9.0])
        .with_series("total:cart", post_start(&event), &[("url", "/a")], &[10.0])
        .with_series("success:cart", post_start(&event), &[("url", "/a")], &[4.5]);
    let provider = Arc::new(provider);

    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", Vec::new())],
    )]);

    let coordinator = BatchCoordinator::new(provider.clone(), Arc::new(props), ScoringMode::Success);
    let summary = coordinator.run_all().await.unwrap();

    assert_eq!(summary.scored(), 1);
    assert_eq!(summary.outcomes[0].score, Some(0.5));

    let sent = provider.sent_metrics();
    let url_metric = sent.iter().find(|m| m.name == "resiliency.url.score").unwrap();
    assert_eq!(url_metric.tags.get("url").map(String::as_str), Some("/a"));
    let service_metric = sent.iter().find(|m| m.name == "resiliency.score").unwrap();
    assert_eq!(service_metric.value, 0.5);
    assert_eq!(service_metric.timestamp_millis, event.end_millis);
}

#[tokio::test]
async fn success_mode_ignores_incomplete_fault_runs() {
    init_test_logging();

    let mut event = recent_event("cpu-fault");
    event.tags.clear();

    let provider = FakeProvider::new().with_event(Some("checkout"), event);
    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", Vec::new())],
    )]);

    let coordinator =
        BatchCoordinator::new(Arc::new(provider), Arc::new(props), ScoringMode::Success);
    let summary = coordinator.run_all().await.unwrap();

    assert_eq!(summary.scored(), 0);
    assert_eq!(summary.failed(), 1);
}
