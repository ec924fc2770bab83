//! Read-only time travel over a finalized move list
//!
//! Reconstruction leans on the position cached in each [`MoveRecord`] at the
//! moment it was applied, so a historical view is byte-deterministic and never
//! re-runs the rules engine. Navigation is a pure local projection: nothing
//! here writes to the live position or the sync channel, and other
//! participants cannot observe it.

use crate::board::codec::Position;
use crate::board::legal::MoveRecord;
use crate::error::{CoreError, CoreResult};

/// Index of the live position in history coordinates
pub const LIVE_INDEX: isize = -1;

/// Position after `moves[0..=index]`, with -1 meaning "all moves applied"
///
/// Valid indices are [-1, len-1]; anything else is a caller bug and reported
/// as [`CoreError::HistoryOutOfRange`].
pub fn position_at(start: &Position, moves: &[MoveRecord], index: isize) -> CoreResult<Position> {
    let len = moves.len();
    let effective = if index == LIVE_INDEX {
        len
    } else if index >= 0 && (index as usize) < len {
        index as usize + 1
    } else {
        return Err(CoreError::HistoryOutOfRange { index, len });
    };
    match effective {
        0 => Ok(start.clone()),
        n => Position::from_fen(&moves[n - 1].fen_after),
    }
}

/// Which half-move a participant is currently looking at
///
/// `None` is live play; the cursor is forced back to live whenever a new
/// chapter or position load replaces the move list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    view: Option<usize>,
}

impl HistoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self) -> bool {
        self.view.is_none()
    }

    pub fn index(&self) -> isize {
        match self.view {
            None => LIVE_INDEX,
            Some(i) => i as isize,
        }
    }

    /// View a half-move; -1 resumes live play
    pub fn seek(&mut self, index: isize, len: usize) -> CoreResult<()> {
        if index == LIVE_INDEX {
            self.view = None;
            return Ok(());
        }
        if index >= 0 && (index as usize) < len {
            self.view = Some(index as usize);
            Ok(())
        } else {
            Err(CoreError::HistoryOutOfRange { index, len })
        }
    }

    /// Snap back to live; called implicitly on loads and resets
    pub fn resume(&mut self) {
        self.view = None;
    }
}
