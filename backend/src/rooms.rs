//! Room registry and per-room broadcast bus
//!
//! One [`tokio::sync::broadcast`] channel per lesson room, owned by the
//! registry behind the router state. Rooms come into existence on first join
//! and are dropped when the last participant leaves; nothing about a room is
//! persisted. Delivery is per-sender FIFO only; the protocol is built so that
//! is enough.

use std::collections::HashMap;
use std::sync::Mutex;

use liveboard_core::protocol::{Participant, ServerMessage, SyncEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

const BUS_CAPACITY: usize = 256;

/// One frame on a room bus, tagged with its origin so the per-connection
/// forwarder can apply the echo rule
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub origin: Option<Uuid>,
    pub echo_to_origin: bool,
    pub message: ServerMessage,
}

impl RoomBroadcast {
    /// Should this frame reach `viewer`'s connection?
    ///
    /// Board events echo to their sender for idempotent convergence; chat does
    /// not, because the sender already appended it optimistically.
    pub fn delivers_to(&self, viewer: Uuid) -> bool {
        self.echo_to_origin || self.origin != Some(viewer)
    }
}

struct RoomState {
    roster: Vec<Participant>,
    tx: broadcast::Sender<RoomBroadcast>,
}

/// All active lesson rooms
#[derive(Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, RoomState>>,
}

impl RoomRegistry {
    pub fn generate_code() -> String {
        use rand::Rng;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut rng = rand::rng();
        (0..8)
            .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
            .collect()
    }

    /// Reserve a fresh room code
    pub fn create(&self) -> String {
        let code = Self::generate_code();
        let mut rooms = self.rooms.lock().unwrap();
        rooms.insert(
            code.clone(),
            RoomState {
                roster: Vec::new(),
                tx: broadcast::Sender::new(BUS_CAPACITY),
            },
        );
        tracing::info!(room = %code, "room created");
        code
    }

    pub fn exists(&self, code: &str) -> bool {
        self.rooms.lock().unwrap().contains_key(code)
    }

    pub fn roster(&self, code: &str) -> Option<Vec<Participant>> {
        self.rooms
            .lock()
            .unwrap()
            .get(code)
            .map(|room| room.roster.clone())
    }

    /// Add a participant, announcing them to everyone already there
    ///
    /// An unknown code creates the room on the spot: joining is what brings a
    /// room to life.
    pub fn join(
        &self,
        code: &str,
        participant: Participant,
    ) -> (broadcast::Receiver<RoomBroadcast>, Vec<Participant>) {
        let mut rooms = self.rooms.lock().unwrap();
        let room = rooms.entry(code.to_string()).or_insert_with(|| {
            tracing::info!(room = %code, "room created on first join");
            RoomState {
                roster: Vec::new(),
                tx: broadcast::Sender::new(BUS_CAPACITY),
            }
        });

        let rx = room.tx.subscribe();
        let _ = room.tx.send(RoomBroadcast {
            origin: Some(participant.id),
            echo_to_origin: false,
            message: ServerMessage::PeerJoined {
                participant: participant.clone(),
            },
        });
        room.roster.push(participant);
        tracing::info!(room = %code, participants = room.roster.len(), "participant joined");
        (rx, room.roster.clone())
    }

    /// Remove a participant, dropping the room when the roster empties
    pub fn leave(&self, code: &str, participant_id: Uuid) {
        let mut rooms = self.rooms.lock().unwrap();
        let Some(room) = rooms.get_mut(code) else {
            return;
        };
        room.roster.retain(|p| p.id != participant_id);
        let _ = room.tx.send(RoomBroadcast {
            origin: Some(participant_id),
            echo_to_origin: false,
            message: ServerMessage::PeerLeft { participant_id },
        });
        if room.roster.is_empty() {
            rooms.remove(code);
            tracing::info!(room = %code, "room dropped, last participant left");
        }
    }

    /// Fan a room event out to the bus
    ///
    /// Everything echoes to its sender except chat; see
    /// [`RoomBroadcast::delivers_to`].
    pub fn relay(&self, code: &str, origin: Uuid, event: SyncEvent) {
        let rooms = self.rooms.lock().unwrap();
        let Some(room) = rooms.get(code) else {
            return;
        };
        let echo_to_origin = !matches!(event, SyncEvent::ChatMessage { .. });
        let _ = room.tx.send(RoomBroadcast {
            origin: Some(origin),
            echo_to_origin,
            message: ServerMessage::Event { event },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_eight_chars_from_the_charset() {
        let code = RoomRegistry::generate_code();
        assert_eq!(code.len(), 8);
        for c in code.chars() {
            assert!(
                c.is_ascii_uppercase() || c.is_ascii_digit(),
                "unexpected room code character {c:?}"
            );
        }
    }

    #[test]
    fn generated_codes_are_unique_enough() {
        // 36^8 values; a collision here means the generator is broken.
        assert_ne!(
            RoomRegistry::generate_code(),
            RoomRegistry::generate_code()
        );
    }

    #[test]
    fn echo_rule_follows_the_event_class() {
        let origin = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        let board = RoomBroadcast {
            origin: Some(origin),
            echo_to_origin: true,
            message: ServerMessage::Error {
                message: String::new(),
            },
        };
        assert!(board.delivers_to(origin));
        assert!(board.delivers_to(viewer));

        let chat = RoomBroadcast {
            origin: Some(origin),
            echo_to_origin: false,
            message: ServerMessage::Error {
                message: String::new(),
            },
        };
        assert!(!chat.delivers_to(origin));
        assert!(chat.delivers_to(viewer));
    }
}
