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

//! End-to-end tests for the single-task executor lifecycle.

use std::sync::Arc;

use rescore::error::ScoreError;
use rescore::executor::ScoreTaskExecutor;
use rescore::models::{ResiliencyScoreTask, Score, TaskStatus};
use rescore::store::{MemoryTaskStore, TaskStore};
use rescore::init_test_logging;

use crate::fixtures::{
    family, post_start, pre_start, properties, query, recent_event, service_config, FakeProvider,
};

#[tokio::test]
async fn run_completes_and_reports_the_score() {
    init_test_logging();

    // pre 2/10 fired (0.2), post 1/10 fired (0.1): score 0.5
    let event = recent_event("cpu-fault");
    let provider = FakeProvider::new()
        .with_event(None, event.clone())
        .with_series(
            "error_rate_alert",
            pre_start(&event),
            &[("host", "a")],
            &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .with_series(
            "error_rate_alert",
            post_start(&event),
            &[("host", "a")],
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );
    let provider = Arc::new(provider);

    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", vec![query("error_rate_alert", 1.0)])],
    )]);
    let store = Arc::new(MemoryTaskStore::new());
    let executor = ScoreTaskExecutor::new(provider.clone(), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(finished.status(), TaskStatus::Completed);
    assert_eq!(finished.score(), Score::Valid(0.5));
    assert!(finished.current_trigger().unwrap().end_time.is_some());

    let sent = provider.sent_metrics();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "resiliency.score");
    assert_eq!(sent[0].value, 0.5);
    assert_eq!(sent[0].tags.get("service").map(String::as_str), Some("cart"));
}

#[tokio::test]
async fn weighted_queries_blend_into_one_score() {
    init_test_logging();

    // q1 (w=1.0) identical windows -> 1.0; q2 (w=2.0) 0.2 vs 0.1 -> 0.5
    // aggregate = (1.0 + 0.5*2.0) / 3.0
    let event = recent_event("cpu-fault");
    let provider = FakeProvider::new()
        .with_event(None, event.clone())
        .with_series("q1", pre_start(&event), &[], &[1.0, 0.0, 0.0, 0.0])
        .with_series("q1", post_start(&event), &[], &[1.0, 0.0, 0.0, 0.0])
        .with_series(
            "q2",
            pre_start(&event),
            &[],
            &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        )
        .with_series(
            "q2",
            post_start(&event),
            &[],
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        );

    let props = properties(vec![family(
        "checkout",
        vec![service_config(
            "cart",
            vec![query("q1", 1.0), query("q2", 2.0)],
        )],
    )]);
    let store = Arc::new(MemoryTaskStore::new());
    let executor = ScoreTaskExecutor::new(Arc::new(provider), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    match finished.score() {
        Score::Valid(score) => assert!((score - 2.0 / 3.0).abs() < 1e-9),
        Score::Invalid => panic!("expected a valid score"),
    }
}

#[tokio::test]
async fn no_events_fails_the_task_with_a_message() {
    init_test_logging();

    let provider = Arc::new(FakeProvider::new());
    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", vec![query("q1", 1.0)])],
    )]);
    let store = Arc::new(MemoryTaskStore::new());
    let executor = ScoreTaskExecutor::new(provider.clone(), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(finished.status(), TaskStatus::Failed);
    assert_eq!(finished.score(), Score::Invalid);
    assert!(finished
        .status_message()
        .unwrap()
        .contains("no fault injection events found"));
    assert!(provider.sent_metrics().is_empty());
}

#[tokio::test]
async fn missing_metric_config_fails_without_retry() {
    init_test_logging();

    let mut props = properties(vec![family(
        "checkout",
        vec![service_config("cart", vec![query("q1", 1.0)])],
    )]);
    props.metrics = None;

    let store = Arc::new(MemoryTaskStore::new());
    let executor =
        ScoreTaskExecutor::new(Arc::new(FakeProvider::new()), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(finished.status(), TaskStatus::Failed);
    assert!(finished
        .status_message()
        .unwrap()
        .contains("no resiliency metric configuration"));
}

#[tokio::test]
async fn unknown_service_fails_the_task() {
    init_test_logging();

    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", vec![query("q1", 1.0)])],
    )]);
    let store = Arc::new(MemoryTaskStore::new());
    let executor =
        ScoreTaskExecutor::new(Arc::new(FakeProvider::new()), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("warehouse");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(finished.status(), TaskStatus::Failed);
    assert!(finished.status_message().unwrap().contains("warehouse"));
}

#[tokio::test]
async fn service_without_queries_fails_with_invalid_sentinel() {
    init_test_logging();

    let props = properties(vec![family(
        "checkout",
        vec![service_config("cart", Vec::new())],
    )]);
    let store = Arc::new(MemoryTaskStore::new());
    let executor =
        ScoreTaskExecutor::new(Arc::new(FakeProvider::new()), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart");
    store.save(&task).await.unwrap();
    executor.run(&task.id).await.unwrap();

    let finished = store.get(&task.id).await.unwrap().unwrap();
    assert_eq!(finished.status(), TaskStatus::Failed);
    assert_eq!(finished.score().to_sentinel(), -1.0);
}

#[tokio::test]
async fn missing_task_is_the_callers_error() {
    init_test_logging();

    let props = properties(Vec::new());
    let executor = ScoreTaskExecutor::new(
        Arc::new(FakeProvider::new()),
        Arc::new(MemoryTaskStore::new()),
        Arc::new(props),
    );

    let result = executor.run("no-such-task").await;
    assert!(matches!(result, Err(ScoreError::TaskNotFound { .. })));
}

#[tokio::test]
async fn scheduled_submit_without_scheduler_is_rejected() {
    init_test_logging();

    let props = properties(Vec::new());
    let store = Arc::new(MemoryTaskStore::new());
    let executor =
        ScoreTaskExecutor::new(Arc::new(FakeProvider::new()), store.clone(), Arc::new(props));

    let task = ResiliencyScoreTask::new("cart").with_schedule(rescore::models::Schedule {
        cron_expression: Some("0 * * * *".to_string()),
        fixed_delay_millis: None,
    });
    store.save(&task).await.unwrap();

    let result = executor.submit(&task).await;
    assert!(matches!(result, Err(ScoreError::SchedulerUnavailable)));
}
