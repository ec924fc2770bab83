//! Engine selection state machine
//!
//! Which engine answers a board drag is a pure function of the current
//! position: if it validates as chess the legal engine is in charge, otherwise
//! free mode is. The mode is re-evaluated on every load and reset, so a setup
//! tool that produces a proper two-king position flips the room back to legal
//! play without any explicit transition call.

use crate::board::codec::Position;
use crate::board::legal;

/// Which engine currently answers board drags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Position validates as chess; moves go through the rules engine
    Legal,
    /// Position is not chess; moves are raw square patches, gated by the
    /// free-move flag
    Free,
}

/// Does this position validate as a legal chess position?
pub fn is_well_formed(position: &Position) -> bool {
    legal::to_chess(position).is_some()
}

impl EngineMode {
    pub fn for_position(position: &Position) -> EngineMode {
        if is_well_formed(position) {
            EngineMode::Legal
        } else {
            EngineMode::Free
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_start_is_legal_mode() {
        assert_eq!(
            EngineMode::for_position(&Position::start()),
            EngineMode::Legal
        );
    }

    #[test]
    fn king_count_anomalies_select_free_mode() {
        for fen in [
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "8/8/8/8/8/8/8/KK5k w - - 0 1",
            "4k3/8/8/8/8/8/8/8 w - - 0 1",
        ] {
            let position = Position::from_fen(fen).unwrap();
            assert_eq!(
                EngineMode::for_position(&position),
                EngineMode::Free,
                "{fen}"
            );
        }
    }

    #[test]
    fn fixing_a_position_flips_back_to_legal() {
        let broken = Position::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(EngineMode::for_position(&broken), EngineMode::Free);
        let fixed = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(EngineMode::for_position(&fixed), EngineMode::Legal);
    }
}
