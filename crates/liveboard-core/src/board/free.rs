//! Rule-unchecked piece relocation for non-chess positions
//!
//! Active only while [`EngineMode::Free`](crate::board::mode::EngineMode) is
//! selected. The whole engine is a gate in front of
//! [`patch_square`](crate::board::codec::patch_square): when the coach has not
//! enabled free movement, the attempt is answered with a visible strict-mode
//! outcome rather than silently dropped, so the student understands why the
//! piece snapped back.

use crate::board::codec::patch_square;
use crate::board::types::Square;
use crate::error::CoreResult;

/// Outcome of a free-mode move attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeMoveOutcome {
    /// The patched placement text to adopt and broadcast
    Applied { fen: String },
    /// Free movement is disabled; the position is untouched and the UI should
    /// say so
    StrictModeBlocked,
}

/// Relocate a piece on raw placement text, gated by the free-move flag
pub fn free_move(
    fen_text: &str,
    from: Square,
    to: Square,
    free_move_enabled: bool,
) -> CoreResult<FreeMoveOutcome> {
    if !free_move_enabled {
        return Ok(FreeMoveOutcome::StrictModeBlocked);
    }
    let fen = patch_square(fen_text, from, to)?;
    Ok(FreeMoveOutcome::Applied { fen })
}
