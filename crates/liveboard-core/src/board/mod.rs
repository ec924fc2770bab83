//! Board state, text codec and the two move engines

pub mod codec;
pub mod free;
pub mod legal;
pub mod mode;
pub mod types;

pub use codec::{patch_square, Position, START_FEN};
pub use free::{free_move, FreeMoveOutcome};
pub use legal::{LoadedGame, MoveOutcome, MoveRecord, RejectReason};
pub use mode::{is_well_formed, EngineMode};
pub use types::{CastlingRights, Piece, PieceColor, PieceKind, Square};
