//! Lesson flow tests
//!
//! Two controllers standing in for a coach and a student, wired together the
//! way the relay wires them: move, override and annotation events are echoed
//! to everyone (sender included), chat only to the others.

use liveboard_core::{
    Chapter, EngineMode, LocalMoveOutcome, Participant, ParticipantRole, RoomController, SyncEvent,
    LIVE_INDEX,
};
use uuid::Uuid;

type TestController = RoomController<Vec<SyncEvent>>;

fn participant(name: &str, role: ParticipantRole) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        name: name.to_string(),
        role,
    }
}

fn pair() -> (TestController, TestController) {
    (
        RoomController::new("LESSON01", participant("Coach Ana", ParticipantRole::Coach), Vec::new()),
        RoomController::new("LESSON01", participant("Sam", ParticipantRole::Student), Vec::new()),
    )
}

/// Relay semantics: everything echoes to the sender except chat.
fn pump(sender: &mut TestController, receiver: &mut TestController) {
    let events: Vec<SyncEvent> = sender.channel_mut().drain(..).collect();
    for event in events {
        let is_chat = matches!(event, SyncEvent::ChatMessage { .. });
        receiver.apply_remote(event.clone()).expect("receiver applies");
        if !is_chat {
            sender.apply_remote(event).expect("sender echo applies");
        }
    }
}

fn sq(name: &str) -> liveboard_core::Square {
    name.parse().expect("valid square")
}

#[test]
fn italian_opening_stays_in_sync() {
    let (mut coach, mut student) = pair();
    for (from, to) in [("e2", "e4"), ("e7", "e5"), ("g1", "f3")] {
        let outcome = coach.local_move(sq(from), sq(to), None).unwrap();
        assert_eq!(outcome, LocalMoveOutcome::Applied);
        pump(&mut coach, &mut student);
    }

    assert_eq!(coach.room().moves().len(), 3);
    assert_eq!(student.room().moves().len(), 3);
    assert_eq!(coach.room().live_fen(), student.room().live_fen());

    // The student scrolls back without anyone noticing.
    let after_e5 = student.view_history(1).unwrap();
    assert_eq!(
        after_e5.to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );
    assert!(student.channel_mut().is_empty());
    assert_eq!(
        student.position_at(LIVE_INDEX).unwrap().to_fen(),
        coach.room().live_fen()
    );
}

#[test]
fn kingless_setup_flows_through_free_mode() {
    let (mut coach, mut student) = pair();
    coach.set_free_move(true);
    student.set_free_move(true);

    coach.load_text("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
    pump(&mut coach, &mut student);
    assert_eq!(coach.room().mode(), EngineMode::Free);
    assert_eq!(student.room().mode(), EngineMode::Free);

    // Empty board: the relocation is a visible no-op but still broadcasts.
    let outcome = coach.local_move(sq("a1"), sq("a2"), None).unwrap();
    assert_eq!(outcome, LocalMoveOutcome::Applied);
    pump(&mut coach, &mut student);
    assert_eq!(student.room().live_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
}

#[test]
fn strict_mode_on_the_student_side_blocks_edits() {
    let (mut coach, mut student) = pair();
    coach.set_free_move(true);
    coach.load_text("8/8/8/8/8/8/8/K7 w - - 0 1").unwrap();
    pump(&mut coach, &mut student);

    // The student never got the free-move permission.
    let outcome = student.local_move(sq("a1"), sq("b2"), None).unwrap();
    assert_eq!(outcome, LocalMoveOutcome::StrictModeBlocked);
    assert_eq!(student.room().live_fen(), "8/8/8/8/8/8/8/K7 w - - 0 1");
    assert!(student.channel_mut().is_empty());
    assert!(student.take_notice().is_some());
}

#[test]
fn annotations_mirror_and_survive_reordering() {
    let (mut coach, mut student) = pair();
    coach.toggle_arrow(sq("g1"), sq("f3")).unwrap();
    coach.cycle_mark(sq("e4")).unwrap();
    pump(&mut coach, &mut student);
    assert_eq!(
        student.room().annotations().snapshot(),
        coach.room().annotations().snapshot()
    );

    // Full-replace snapshots: applying an older one then a newer one leaves
    // everyone on the newer set.
    coach.toggle_arrow(sq("g1"), sq("f3")).unwrap();
    pump(&mut coach, &mut student);
    assert_eq!(student.room().annotations().arrows().len(), 0);
    assert_eq!(
        student.room().annotations().mark_at(sq("e4")),
        coach.room().annotations().mark_at(sq("e4"))
    );
}

#[test]
fn chapter_loads_clear_annotations_on_both_sides() {
    let (mut coach, mut student) = pair();
    coach.set_playlist(vec![
        Chapter {
            name: "Scholar's mate".to_string(),
            source: "1. e4 e5 2. Bc4 Nc6 3. Qh5".to_string(),
        },
        Chapter {
            name: "Rook endgame drill".to_string(),
            source: "8/8/8/8/8/1k6/r7/4K3 w - - 0 1".to_string(),
        },
    ]);

    student.toggle_arrow(sq("a1"), sq("h8")).unwrap();
    pump(&mut student, &mut coach);

    assert!(coach.load_chapter(0).unwrap());
    pump(&mut coach, &mut student);
    assert!(coach.room().annotations().is_empty());
    assert!(student.room().annotations().is_empty());
    assert_eq!(student.room().live_fen(), coach.room().live_fen());

    student.toggle_arrow(sq("h5"), sq("f7")).unwrap();
    pump(&mut student, &mut coach);

    assert!(coach.next_chapter().unwrap());
    pump(&mut coach, &mut student);
    assert!(coach.room().annotations().is_empty());
    assert!(student.room().annotations().is_empty());
    assert_eq!(student.room().live_fen(), "8/8/8/8/8/1k6/r7/4K3 w - - 0 1");
}

#[test]
fn chat_reaches_the_other_side_exactly_once() {
    let (mut coach, mut student) = pair();
    coach.send_chat("watch the f7 square").unwrap();
    pump(&mut coach, &mut student);
    assert_eq!(coach.room().chat().len(), 1);
    assert_eq!(student.room().chat().len(), 1);
    assert_eq!(student.room().chat()[0].text, "watch the f7 square");
}

#[test]
fn late_joiner_converges_on_the_next_broadcast() {
    let (mut coach, mut student) = pair();
    coach.local_move(sq("e2"), sq("e4"), None).unwrap();
    coach.channel_mut().clear(); // the student was not connected yet

    // No catch-up push exists; the next move brings the late joiner in line.
    coach.local_move(sq("e7"), sq("e5"), None).unwrap();
    pump(&mut coach, &mut student);
    assert_eq!(student.room().live_fen(), coach.room().live_fen());
}
