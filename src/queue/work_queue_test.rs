use std::time::Duration;

use tokio::time::timeout;
use tokio::time::Instant;

use super::*;
use crate::QueueConfig;

fn test_queue() -> WorkQueue<String> {
    WorkQueue::from_config(&QueueConfig {
        base_delay_ms: 5,
        max_delay_ms: 1_000,
    })
}

#[tokio::test]
async fn add_should_coalesce_pending_keys() {
    let queue = test_queue();

    queue.add("ns/gw".to_string());
    queue.add("ns/gw".to_string());
    queue.add("ns/gw".to_string());

    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get().await, Some("ns/gw".to_string()));
    assert!(queue.is_empty());
}

#[tokio::test]
async fn get_should_return_keys_in_arrival_order() {
    let queue = test_queue();
    queue.add("a".to_string());
    queue.add("b".to_string());
    queue.add("a".to_string());
    queue.add("c".to_string());

    assert_eq!(queue.get().await.as_deref(), Some("a"));
    assert_eq!(queue.get().await.as_deref(), Some("b"));
    assert_eq!(queue.get().await.as_deref(), Some("c"));
}

#[tokio::test]
async fn re_add_while_processing_should_requeue_on_done() {
    let queue = test_queue();
    queue.add("a".to_string());
    let key = queue.get().await.unwrap();

    queue.add("a".to_string());
    assert_eq!(queue.len(), 0, "key under processing must not be handed out twice");

    queue.done(&key);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.get().await.as_deref(), Some("a"));
}

#[tokio::test]
async fn done_without_re_add_should_not_requeue() {
    let queue = test_queue();
    queue.add("a".to_string());
    let key = queue.get().await.unwrap();

    queue.done(&key);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn get_should_wake_up_on_add() {
    let queue = test_queue();
    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.get().await })
    };

    tokio::task::yield_now().await;
    queue.add("late".to_string());

    let got = timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should be woken")
        .unwrap();
    assert_eq!(got.as_deref(), Some("late"));
}

#[tokio::test]
async fn shut_down_should_unblock_pending_and_future_gets() {
    let queue = test_queue();
    let consumer = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.get().await })
    };
    tokio::task::yield_now().await;

    queue.shut_down();
    queue.shut_down();

    let got = timeout(Duration::from_secs(1), consumer)
        .await
        .expect("pending get should be released")
        .unwrap();
    assert_eq!(got, None);
    assert_eq!(queue.get().await, None);
    assert!(queue.is_shutting_down());
}

#[tokio::test]
async fn shut_down_should_win_over_queued_keys() {
    let queue = test_queue();
    queue.add("a".to_string());

    queue.shut_down();
    queue.add("b".to_string());

    assert_eq!(queue.get().await, None);
}

#[tokio::test(start_paused = true)]
async fn add_rate_limited_should_back_off_exponentially() {
    let queue = test_queue();
    let key = "ns/gw".to_string();
    let start = Instant::now();

    queue.add_rate_limited(key.clone());
    assert!(queue.is_empty());
    assert!(timeout(Duration::from_millis(4), queue.get()).await.is_err());

    let got = queue.get().await.unwrap();
    assert_eq!(got, key);
    assert!(start.elapsed() >= Duration::from_millis(5));
    queue.done(&got);
    assert_eq!(queue.num_requeues(&key), 1);

    let second = Instant::now();
    queue.add_rate_limited(key.clone());
    let got = queue.get().await.unwrap();
    assert!(second.elapsed() >= Duration::from_millis(10));
    queue.done(&got);
    assert_eq!(queue.num_requeues(&key), 2);

    queue.forget(&key);
    assert_eq!(queue.num_requeues(&key), 0);
}

#[tokio::test(start_paused = true)]
async fn add_after_should_keep_earliest_deadline() {
    let queue = test_queue();
    let start = Instant::now();

    queue.add_after("a".to_string(), Duration::from_millis(100));
    queue.add_after("a".to_string(), Duration::from_millis(20));

    assert_eq!(queue.get().await.as_deref(), Some("a"));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(100));
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shut_down_should_drop_delayed_keys() {
    let queue = test_queue();
    queue.add_after("a".to_string(), Duration::from_millis(50));

    queue.shut_down();
    tokio::time::advance(Duration::from_millis(100)).await;

    assert_eq!(queue.get().await, None);
}
