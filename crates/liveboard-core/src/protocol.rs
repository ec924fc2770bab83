//! Wire protocol for the lesson room channel
//!
//! All payloads are tagged JSON enums, exhaustively matched at every receiver.
//! Every board-state payload fully determines the next local state (a FEN or a
//! complete annotation set, never a delta), so per-sender FIFO delivery is the
//! only ordering the protocol needs: a stale message is simply superseded by
//! the next one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotations::AnnotationSnapshot;
use crate::board::types::{PieceKind, Square};

/// Who is sitting in the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Coach,
    Student,
}

/// Room-scoped events, broadcast on the lesson bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A rule-checked move; the FEN is included so receivers converge even if
    /// their local replay disagrees
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        fen: String,
    },
    /// Full position replacement: free-mode patches, setup loads, chapter
    /// loads, resets and undo
    PositionOverride { fen: String },
    /// Full-replace annotation set
    AnnotationSync { snapshot: AnnotationSnapshot },
    /// Chat line; the relay never echoes this back to its sender
    ChatMessage {
        text: String,
        sender_id: Uuid,
        sender_name: String,
        timestamp: DateTime<Utc>,
    },
}

/// Client -> server frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Must be the first frame on a fresh connection
    Join {
        room: String,
        participant: Participant,
    },
    Event { event: SyncEvent },
    Leave,
}

/// Server -> client frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Membership confirmed; carries the current roster
    Joined {
        room: String,
        roster: Vec<Participant>,
    },
    PeerJoined { participant: Participant },
    PeerLeft { participant_id: Uuid },
    Event { event: SyncEvent },
    Error { message: String },
}
