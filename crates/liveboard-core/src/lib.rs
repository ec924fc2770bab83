//! Liveboard core: the synchronization engine behind a live chess lesson
//!
//! One coach and any number of students share a single board. The pieces of
//! that puzzle live here:
//!
//! - [`board`] — position text codec, the `shakmaty`-backed legal engine, and
//!   the free-mode engine for deliberately rule-violating setups
//! - [`annotations`] — arrows and square highlights with deterministic toggle
//!   rules
//! - [`history`] — read-only time travel over the move list
//! - [`playlist`] — lesson chapters
//! - [`protocol`] — the tagged event types carried by the room channel
//! - [`room`] — the per-room controller tying it all together
//!
//! The crate is transport-agnostic: [`room::SyncChannel`] is the only seam to
//! the network, and the `backend` crate provides the relay that fans events
//! out to a room's participants.

pub mod annotations;
pub mod board;
pub mod collab;
pub mod error;
pub mod history;
pub mod playlist;
pub mod protocol;
pub mod room;

pub use annotations::{AnnotationLayer, AnnotationSnapshot, Arrow, MarkSlot};
pub use board::{
    free_move, is_well_formed, patch_square, EngineMode, FreeMoveOutcome, MoveOutcome, MoveRecord,
    Piece, PieceColor, PieceKind, Position, RejectReason, Square, START_FEN,
};
pub use error::{CoreError, CoreResult};
pub use history::{HistoryCursor, LIVE_INDEX};
pub use playlist::{Chapter, Playlist};
pub use protocol::{ClientMessage, Participant, ParticipantRole, ServerMessage, SyncEvent};
pub use room::{
    ChatEntry, ConnectionStatus, LivePosition, LocalMoveOutcome, Room, RoomController, SyncChannel,
};
