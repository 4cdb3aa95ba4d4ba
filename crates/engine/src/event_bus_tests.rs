// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fj_core::Job;
use parking_lot::Mutex;

fn created(id: &str) -> FleetEvent {
    FleetEvent::JobCreated {
        job: Job::builder().id(id).build(),
    }
}

fn reloaded() -> FleetEvent {
    FleetEvent::ConfigReloaded { agents: vec![] }
}

fn recorder(bus: &EventBus, topic: Option<&str>) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let listener = move |event: &FleetEvent| {
        sink.lock().push(event.name().to_string());
        Ok(())
    };
    match topic {
        Some(topic) => bus.on(topic, listener),
        None => bus.on_any(listener),
    };
    seen
}

#[test]
fn named_listeners_only_see_their_event() {
    let bus = EventBus::new();
    let created_only = recorder(&bus, Some("job:created"));
    let everything = recorder(&bus, None);

    bus.emit(&created("job-1"));
    bus.emit(&reloaded());

    assert_eq!(*created_only.lock(), vec!["job:created"]);
    assert_eq!(*everything.lock(), vec!["job:created", "config:reloaded"]);
}

#[test]
fn failing_listener_does_not_stop_dispatch() {
    let bus = EventBus::new();
    bus.on_any(|_| Err("listener broke".into()));
    let after = recorder(&bus, None);

    bus.emit(&created("job-1"));
    assert_eq!(after.lock().len(), 1);
}

#[test]
fn panicking_listener_is_contained() {
    let bus = EventBus::new();
    bus.on("job:created", |_| panic!("listener exploded"));
    let after = recorder(&bus, Some("job:created"));

    bus.emit(&created("job-1"));
    bus.emit(&created("job-2"));
    assert_eq!(after.lock().len(), 2);
}

#[test]
fn off_removes_subscription() {
    let bus = EventBus::new();
    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    let id = bus.on_any(move |_| {
        *sink.lock() += 1;
        Ok(())
    });

    bus.emit(&reloaded());
    assert!(bus.off(id));
    assert!(!bus.off(id));
    bus.emit(&reloaded());

    assert_eq!(*count.lock(), 1);
    assert_eq!(bus.listener_count(), 0);
}

#[test]
fn listeners_may_unsubscribe_during_dispatch() {
    let bus = Arc::new(EventBus::new());
    let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

    let bus_ref = Arc::downgrade(&bus);
    let slot_ref = slot.clone();
    let id = bus.on_any(move |_| {
        if let (Some(bus), Some(id)) = (bus_ref.upgrade(), *slot_ref.lock()) {
            bus.off(id);
        }
        Ok(())
    });
    *slot.lock() = Some(id);

    bus.emit(&reloaded());
    assert_eq!(bus.listener_count(), 0);
}

#[tokio::test]
async fn channel_forwards_events_in_order() {
    let bus = EventBus::new();
    let (id, mut rx) = bus.channel();

    bus.emit(&created("job-1"));
    bus.emit(&created("job-2"));

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.job_id().map(|j| j.as_str()), Some("job-1"));
    assert_eq!(second.job_id().map(|j| j.as_str()), Some("job-2"));

    drop(rx);
    bus.emit(&reloaded());
    assert!(bus.off(id));
}
