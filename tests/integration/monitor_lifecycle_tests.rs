//! Integration tests for starting, switching and stopping observations.

use std::time::Duration;

use shipment_watch::reconcile::session::SessionUpdate;
use shipment_watch::AppError;

use super::test_helpers::{
    collect_until, collect_until_finished, status, test_monitor, FakeEngine,
};

#[tokio::test]
async fn create_instance_starts_observing_the_new_id() {
    let engine = FakeEngine::new();
    engine.push_snapshots("ship-late-delivery", [status("ORDER_RECEIVED"), status("DELIVERED")]);
    let (mut monitor, mut rx) = test_monitor(&engine);

    let instance_id = monitor
        .create_instance("late-delivery")
        .await
        .expect("instance created");
    assert_eq!(instance_id, "ship-late-delivery");
    assert_eq!(monitor.instance_id(), Some("ship-late-delivery"));

    let events = collect_until_finished(&mut rx).await;
    assert!(events
        .iter()
        .all(|event| event.instance_id == "ship-late-delivery"));
}

#[tokio::test]
async fn failed_create_leaves_current_observation_running() {
    let engine = FakeEngine::new();
    engine.push_snapshots("ship-a", [status("TRANSPORT_STARTED")]);
    let (mut monitor, _rx) = test_monitor(&engine);
    monitor.observe("ship-a").await;

    engine.fail_create(true);
    let err = monitor.create_instance("bogus").await.unwrap_err();
    assert!(matches!(err, AppError::Engine { status: 422, .. }));
    assert_eq!(monitor.instance_id(), Some("ship-a"));
    assert!(monitor.is_polling());
    monitor.stop().await;
}

#[tokio::test]
async fn switching_instances_discards_previous_state() {
    let engine = FakeEngine::new();
    engine.push_snapshots("ship-a", [status("CUSTOMS_CLEARANCE")]);
    engine.push_snapshots("ship-b", [status("ORDER_RECEIVED")]);
    let (mut monitor, mut rx) = test_monitor(&engine);

    monitor.observe("ship-a").await;
    collect_until(&mut rx, |event| matches!(event.update, SessionUpdate::Progress(_))).await;

    monitor.observe("ship-b").await;
    let fetches_a = engine.fetch_count("ship-a");

    let events = collect_until(&mut rx, |event| {
        event.instance_id == "ship-b" && matches!(event.update, SessionUpdate::Progress(_))
    })
    .await;
    assert!(
        events.iter().all(|event| event.instance_id == "ship-b"),
        "events from the abandoned instance leaked: {events:?}"
    );

    let session = monitor.session().expect("session");
    let session = session.lock().await;
    assert_eq!(session.instance_id(), "ship-b");
    assert_eq!(session.log().len(), 1);
    assert_eq!(
        session.log()[0].message,
        "Status changed to ORDER_RECEIVED (Order Received)"
    );
    drop(session);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.fetch_count("ship-a"), fetches_a, "old poller kept fetching");
    monitor.stop().await;
}

#[tokio::test]
async fn stop_during_an_in_flight_fetch_publishes_nothing() {
    let engine = FakeEngine::new();
    engine.set_fetch_delay(Duration::from_millis(200));
    engine.push_snapshots("ship-slow", [status("PAYMENT_RECEIVED")]);
    let (mut monitor, mut rx) = test_monitor(&engine);

    monitor.observe("ship-slow").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    monitor.stop().await;

    assert!(!monitor.is_polling());
    assert!(monitor.instance_id().is_none());
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err(), "nothing may be published after stop");
}

#[tokio::test]
async fn dispatcher_requires_an_observation() {
    let engine = FakeEngine::new();
    let (monitor, _rx) = test_monitor(&engine);
    assert!(matches!(monitor.dispatcher(), Err(AppError::NotObserving)));
    assert!(monitor.session().is_none());
}
