//! Wire contract tests for TaskEvent.
//! These pin the JSON shape both services depend on. No broker needed.

use chrono::Utc;
use serde_json::json;
use tasklist_events::{
    partition_for, Delivery, EventDecodeError, EventKind, TaskEvent, TASK_EVENTS_TOPIC,
    TASK_PROJECTOR_GROUP,
};

fn delivery(key: &str, payload: serde_json::Value) -> Delivery {
    Delivery {
        topic: TASK_EVENTS_TOPIC.to_string(),
        partition: 0,
        offset: 0,
        key: key.to_string(),
        payload,
        ts: Utc::now(),
    }
}

// =========================================================================
// Serialized shape
// =========================================================================

#[test]
fn created_serializes_flat_with_kind_tag() {
    let event = TaskEvent::Created {
        id: 1,
        description: "buy milk".into(),
        completed: false,
    };

    assert_eq!(
        event.to_payload().unwrap(),
        json!({"kind": "Created", "id": 1, "description": "buy milk", "completed": false})
    );
}

#[test]
fn updated_serializes_flat_with_kind_tag() {
    let event = TaskEvent::Updated {
        id: 1,
        description: "buy milk".into(),
        completed: true,
    };

    assert_eq!(
        event.to_payload().unwrap(),
        json!({"kind": "Updated", "id": 1, "description": "buy milk", "completed": true})
    );
}

#[test]
fn deleted_carries_identity_only() {
    let payload = TaskEvent::Deleted { id: 5 }.to_payload().unwrap();
    assert_eq!(payload, json!({"kind": "Deleted", "id": 5}));
}

#[test]
fn deleted_ignores_payload_fields_on_the_wire() {
    let event = TaskEvent::from_payload(
        &json!({"kind": "Deleted", "id": 5, "description": null, "completed": false}),
    )
    .unwrap();
    assert_eq!(event, TaskEvent::Deleted { id: 5 });
}

#[test]
fn unknown_kind_is_malformed() {
    let err = TaskEvent::from_payload(&json!({"kind": "Archived", "id": 5})).unwrap_err();
    assert!(matches!(err, EventDecodeError::Malformed(_)));
}

#[test]
fn created_without_description_is_malformed() {
    let err = TaskEvent::from_payload(&json!({"kind": "Created", "id": 5, "completed": false}))
        .unwrap_err();
    assert!(matches!(err, EventDecodeError::Malformed(_)));
}

// =========================================================================
// Identity and keying
// =========================================================================

#[test]
fn partition_key_is_decimal_id() {
    let event = TaskEvent::Updated {
        id: 42,
        description: "x".into(),
        completed: false,
    };
    assert_eq!(event.partition_key(), "42");
    assert_eq!(event.id(), 42);
    assert_eq!(event.kind(), EventKind::Updated);
}

#[test]
fn every_kind_for_one_task_maps_to_one_partition() {
    let events = [
        TaskEvent::Created { id: 9, description: "a".into(), completed: false },
        TaskEvent::Updated { id: 9, description: "b".into(), completed: true },
        TaskEvent::Deleted { id: 9 },
    ];

    let partitions: Vec<u32> = events
        .iter()
        .map(|e| partition_for(&e.partition_key(), 8))
        .collect();
    assert!(partitions.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn channel_names_are_fixed() {
    assert_eq!(TASK_EVENTS_TOPIC, "task-events");
    assert_eq!(TASK_PROJECTOR_GROUP, "task-group");
}

#[test]
fn event_kind_displays_its_wire_name() {
    assert_eq!(EventKind::Created.to_string(), "Created");
    assert_eq!(EventKind::Deleted.to_string(), "Deleted");
}

// =========================================================================
// Delivery decoding
// =========================================================================

#[test]
fn delivery_decodes_matching_key() {
    let d = delivery("3", json!({"kind": "Deleted", "id": 3}));
    assert_eq!(d.decode().unwrap(), TaskEvent::Deleted { id: 3 });
}

#[test]
fn delivery_rejects_key_that_disagrees_with_id() {
    let d = delivery("4", json!({"kind": "Deleted", "id": 3}));
    match d.decode().unwrap_err() {
        EventDecodeError::KeyMismatch { key, id } => {
            assert_eq!(key, "4");
            assert_eq!(id, 3);
        }
        other => panic!("expected KeyMismatch, got {other:?}"),
    }
}
