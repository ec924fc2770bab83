//! Registry-level flow tests: two participants share a room bus and the echo
//! rule decides which frames reach which connection.

use backend::rooms::{RoomBroadcast, RoomRegistry};
use chrono::Utc;
use liveboard_core::protocol::{Participant, ParticipantRole, ServerMessage, SyncEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

fn coach() -> Participant {
    Participant {
        id: Uuid::new_v4(),
        name: "Coach Dana".to_string(),
        role: ParticipantRole::Coach,
    }
}

fn student() -> Participant {
    Participant {
        id: Uuid::new_v4(),
        name: "Sam".to_string(),
        role: ParticipantRole::Student,
    }
}

/// Drain everything currently queued for `viewer`, applying the echo rule the
/// way the per-connection forwarder does.
fn deliverable(
    rx: &mut broadcast::Receiver<RoomBroadcast>,
    viewer: Uuid,
) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if frame.delivers_to(viewer) {
            out.push(frame.message);
        }
    }
    out
}

#[tokio::test]
async fn joining_announces_the_newcomer_to_everyone_else() {
    let registry = RoomRegistry::default();
    let code = registry.create();
    let coach = coach();
    let student = student();

    let (mut coach_rx, roster) = registry.join(&code, coach.clone());
    assert_eq!(roster.len(), 1);

    let (_student_rx, roster) = registry.join(&code, student.clone());
    assert_eq!(roster.len(), 2);

    let frames = deliverable(&mut coach_rx, coach.id);
    assert_eq!(frames.len(), 1);
    match &frames[0] {
        ServerMessage::PeerJoined { participant } => assert_eq!(participant.id, student.id),
        other => panic!("expected PeerJoined, got {other:?}"),
    }
}

#[tokio::test]
async fn joining_an_unknown_code_creates_the_room() {
    let registry = RoomRegistry::default();
    assert!(!registry.exists("FRESH123"));

    let (_rx, roster) = registry.join("FRESH123", coach());
    assert!(registry.exists("FRESH123"));
    assert_eq!(roster.len(), 1);
}

#[tokio::test]
async fn moves_echo_to_their_sender() {
    let registry = RoomRegistry::default();
    let code = registry.create();
    let coach = coach();
    let student = student();
    let (mut coach_rx, _) = registry.join(&code, coach.clone());
    let (mut student_rx, _) = registry.join(&code, student.clone());
    // flush the join announcements
    deliverable(&mut coach_rx, coach.id);
    deliverable(&mut student_rx, student.id);

    registry.relay(
        &code,
        coach.id,
        SyncEvent::Move {
            from: "e2".parse().expect("square"),
            to: "e4".parse().expect("square"),
            promotion: None,
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".to_string(),
        },
    );

    let to_coach = deliverable(&mut coach_rx, coach.id);
    let to_student = deliverable(&mut student_rx, student.id);
    assert_eq!(to_coach.len(), 1, "move echoes back to its sender");
    assert_eq!(to_student.len(), 1);
    assert!(matches!(
        &to_student[0],
        ServerMessage::Event {
            event: SyncEvent::Move { .. }
        }
    ));
}

#[tokio::test]
async fn chat_is_never_echoed_to_its_sender() {
    let registry = RoomRegistry::default();
    let code = registry.create();
    let coach = coach();
    let student = student();
    let (mut coach_rx, _) = registry.join(&code, coach.clone());
    let (mut student_rx, _) = registry.join(&code, student.clone());
    deliverable(&mut coach_rx, coach.id);
    deliverable(&mut student_rx, student.id);

    registry.relay(
        &code,
        coach.id,
        SyncEvent::ChatMessage {
            text: "watch the d-file".to_string(),
            sender_id: coach.id,
            sender_name: coach.name.clone(),
            timestamp: Utc::now(),
        },
    );

    assert!(deliverable(&mut coach_rx, coach.id).is_empty());
    assert_eq!(deliverable(&mut student_rx, student.id).len(), 1);
}

#[tokio::test]
async fn leaving_announces_the_departure_and_drops_empty_rooms() {
    let registry = RoomRegistry::default();
    let code = registry.create();
    let coach = coach();
    let student = student();
    let (mut coach_rx, _) = registry.join(&code, coach.clone());
    let (_student_rx, _) = registry.join(&code, student.clone());
    deliverable(&mut coach_rx, coach.id);

    registry.leave(&code, student.id);
    let frames = deliverable(&mut coach_rx, coach.id);
    assert_eq!(frames.len(), 1);
    match &frames[0] {
        ServerMessage::PeerLeft { participant_id } => assert_eq!(*participant_id, student.id),
        other => panic!("expected PeerLeft, got {other:?}"),
    }
    assert!(registry.exists(&code));

    registry.leave(&code, coach.id);
    assert!(!registry.exists(&code));
}
