mod common;

use autodialer::config::SweepOutcome;
use autodialer::orchestration::CallbackOutcome;
use autodialer::queue::{DispatchQueue, DispatchReason};
use autodialer::state_machine::ContactStatus;
use chrono::{Duration, Utc};
use common::{test_config, TestDialer};

fn dialer_with_outcome(outcome: SweepOutcome, max_attempts: u32) -> TestDialer {
    let mut config = test_config();
    config.sweep.outcome = outcome;
    config.sweep.max_attempts = max_attempts;
    TestDialer::with_config(config)
}

#[tokio::test]
async fn test_stale_call_is_failed_and_queue_advances() {
    let dialer = dialer_with_outcome(SweepOutcome::Failed, 3);
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.system.engine.dispatch(ids[0]).await.unwrap();

    let report = dialer
        .system
        .sweeper()
        .sweep_once(Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(report.failed, vec![ids[0]]);
    assert!(report.retried.is_empty());
    assert_eq!(report.next_contact_id, Some(ids[1]));

    let stale = dialer.contact(ids[0]).await;
    assert_eq!(stale.status, ContactStatus::Failed);
    assert!(stale.last_called_at.is_some());

    let attempts = dialer.attempts(ids[0]).await;
    assert_eq!(attempts.last().map(|a| a.status.as_str()), Some("timeout"));

    dialer.drain().await;
    assert_eq!(dialer.contact(ids[1]).await.status, ContactStatus::InProgress);
}

#[tokio::test]
async fn test_stale_call_is_retried_until_attempts_run_out() {
    let dialer = dialer_with_outcome(SweepOutcome::Retry, 2);
    let id = dialer.seed(&["+919876543210"])[0];
    dialer.system.engine.dispatch(id).await.unwrap();
    let sweeper = dialer.system.sweeper();

    let first = sweeper
        .sweep_once(Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(first.retried, vec![id]);
    assert_eq!(first.next_contact_id, None);
    assert_eq!(dialer.contact(id).await.status, ContactStatus::Retry);
    assert_eq!(
        dialer.queue.pending_commands()[0].reason,
        DispatchReason::StalenessSweep
    );

    dialer.drain().await;
    assert_eq!(dialer.contact(id).await.status, ContactStatus::InProgress);
    assert_eq!(dialer.client.requests().len(), 2);

    let second = sweeper
        .sweep_once(Utc::now() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(second.failed, vec![id]);
    assert_eq!(dialer.contact(id).await.status, ContactStatus::Failed);

    let timeouts = dialer
        .attempts(id)
        .await
        .into_iter()
        .filter(|a| a.status == "timeout")
        .count();
    assert_eq!(timeouts, 2);
}

#[tokio::test]
async fn test_fresh_call_is_left_alone() {
    let dialer = TestDialer::new();
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.system.engine.dispatch(ids[0]).await.unwrap();

    let report = dialer.system.sweeper().sweep_once(Utc::now()).await.unwrap();

    assert_eq!(report.reclaimed(), 0);
    assert_eq!(report.next_contact_id, None);
    assert_eq!(dialer.contact(ids[0]).await.status, ContactStatus::InProgress);
    assert!(dialer.queue.pending_commands().is_empty());
}

#[tokio::test]
async fn test_closed_calls_are_not_swept() {
    let dialer = TestDialer::new();
    let id = dialer.seed(&["+919876543210"])[0];
    dialer.system.engine.dispatch(id).await.unwrap();
    dialer.callback(id, "completed").await;

    let report = dialer
        .system
        .sweeper()
        .sweep_once(Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(report.reclaimed(), 0);
    assert_eq!(dialer.contact(id).await.status.as_str(), "completed");
}

#[tokio::test]
async fn test_retry_contact_is_redialed_after_losing_the_line() {
    let dialer = dialer_with_outcome(SweepOutcome::Retry, 3);
    let first = dialer.seed(&["+911111111111"])[0];
    dialer.system.engine.dispatch(first).await.unwrap();

    let report = dialer
        .system
        .sweeper()
        .sweep_once(Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(report.retried, vec![first]);

    // A second contact takes the line before the retry command runs.
    let second = dialer.seed(&["+912222222222"])[0];
    dialer.system.engine.dispatch(second).await.unwrap();
    dialer.drain().await;
    assert_eq!(dialer.contact(first).await.status, ContactStatus::Retry);

    let outcome = dialer.callback(second, "completed").await;
    assert!(matches!(
        outcome,
        CallbackOutcome::Applied { next_contact_id: Some(id), .. } if id == first
    ));

    dialer.drain().await;
    assert_eq!(dialer.contact(first).await.status, ContactStatus::InProgress);
    assert_eq!(dialer.client.requests().len(), 3);
}

#[tokio::test]
async fn test_lost_command_is_replaced_on_idle_line() {
    let dialer = TestDialer::new();
    let ids = dialer.seed(&["+911111111111", "+912222222222"]);
    dialer.system.trigger.start_batch().await.unwrap();

    // The worker took the command and went away before claiming the contact.
    let lost = dialer.queue.dequeue().await.unwrap().unwrap();
    assert_eq!(lost.contact_id, ids[0]);
    assert_eq!(dialer.contact(ids[0]).await.status, ContactStatus::Pending);

    let sweeper = dialer.system.sweeper();
    let report = sweeper.sweep_once(Utc::now()).await.unwrap();
    assert_eq!(report.reclaimed(), 0);
    assert_eq!(report.next_contact_id, Some(ids[0]));

    let again = sweeper.sweep_once(Utc::now()).await.unwrap();
    assert_eq!(again.next_contact_id, None);
    assert_eq!(dialer.queue.pending_commands().len(), 1);

    dialer.drain().await;
    assert_eq!(dialer.contact(ids[0]).await.status, ContactStatus::InProgress);
    assert_eq!(dialer.contact(ids[1]).await.status, ContactStatus::Pending);
}
