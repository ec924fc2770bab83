//! Error types for the classroom core
//!
//! Covers position text parsing, free-move patching, game-text loading, and
//! channel transport. Rule-level rejections are NOT errors: an illegal move is
//! an expected outcome and is reported through [`MoveOutcome`], not here.
//!
//! [`MoveOutcome`]: crate::board::legal::MoveOutcome

use thiserror::Error;

/// Errors that can occur in the classroom core
#[derive(Error, Debug)]
pub enum CoreError {
    /// Placement text does not describe 8 ranks
    #[error("expected 8 ranks in placement text, found {found}")]
    BadRankCount { found: usize },

    /// A rank expands to more or fewer than 8 squares
    #[error("rank {rank} of placement text does not describe 8 squares")]
    BadRankWidth { rank: usize },

    /// Unknown character in placement text
    #[error("unexpected character {c:?} in placement text")]
    BadPlacementChar { c: char },

    /// A non-placement FEN field is malformed
    #[error("malformed {field} field: {value:?}")]
    BadField {
        field: &'static str,
        value: String,
    },

    /// Square name outside the 8x8 grid
    #[error("square {name:?} is outside the board")]
    OutOfBoundsSquare { name: String },

    /// Input yields neither a playable game nor a standalone position
    #[error("text is neither move text nor a position: {reason}")]
    UnloadableText { reason: String },

    /// Replay of a recorded move list failed
    #[error("move list replay broke at half-move {index}: {san}")]
    ReplayDiverged { index: usize, san: String },

    /// History index outside [-1, len-1]
    #[error("history index {index} out of range for {len} moves")]
    HistoryOutOfRange { index: isize, len: usize },

    /// The sync channel is gone; local state is kept for reconvergence
    #[error("sync channel closed")]
    ChannelClosed,
}

/// Result type alias for classroom core operations
pub type CoreResult<T> = Result<T, CoreError>;
