//! Position text codec
//!
//! Parses and serializes the standard slash-separated placement format
//! ("rnbqkbnr/pppppppp/... w KQkq - 0 1") into an explicit 8x8 grid. The codec
//! deliberately accepts any occupancy: no kings, three queens-a-side, lone
//! pawns on the back rank. Chess legality is a separate concern handled by
//! [`crate::board::legal`]; lesson setup positions are frequently not legal
//! chess and still need to render, sync and patch.
//!
//! `patch_square` is the heart of free mode: a raw square-to-square relocation
//! on the serialized text that expands each rank's run-length counts, moves the
//! occupant (overwriting whatever sits on the destination), and re-compresses.
//! It only fails on text that is not grid-shaped; occupancy anomalies are fine.

use std::fmt;

use crate::board::types::{CastlingRights, Piece, PieceColor, Square};
use crate::error::{CoreError, CoreResult};

/// Placement text of the standard chess starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

type Grid = [[Option<Piece>; 8]; 8];

/// Full board state: occupancy grid plus the five bookkeeping fields
///
/// `grid[rank][file]` with rank 0 = white's back rank. A `Position` carries no
/// legality guarantee; see [`crate::board::mode::is_well_formed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    grid: Grid,
    pub side_to_move: PieceColor,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Position {
    /// The standard chess starting position
    pub fn start() -> Self {
        Self::from_fen(START_FEN).expect("start FEN is well formed")
    }

    /// An empty board, white to move, no castling rights
    pub fn empty() -> Self {
        Position {
            grid: [[None; 8]; 8],
            side_to_move: PieceColor::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.grid[sq.rank() as usize][sq.file() as usize]
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.grid[sq.rank() as usize][sq.file() as usize] = piece;
    }

    /// Parse the six-field placement format
    ///
    /// Trailing fields may be omitted; they default to "w - - 0 1" so that
    /// bare placement strings from setup tools still load.
    pub fn from_fen(text: &str) -> CoreResult<Self> {
        let mut fields = text.split_whitespace();
        let placement = fields.next().ok_or(CoreError::BadRankCount { found: 0 })?;
        let grid = parse_placement(placement)?;

        let side_to_move = match fields.next() {
            None | Some("w") => PieceColor::White,
            Some("b") => PieceColor::Black,
            Some(other) => {
                return Err(CoreError::BadField {
                    field: "side-to-move",
                    value: other.to_string(),
                })
            }
        };
        let castling = match fields.next() {
            None => CastlingRights::none(),
            Some(f) => CastlingRights::parse(f)?,
        };
        let en_passant = match fields.next() {
            None | Some("-") => None,
            Some(f) => Some(f.parse::<Square>().map_err(|_| CoreError::BadField {
                field: "en-passant",
                value: f.to_string(),
            })?),
        };
        let halfmove_clock = parse_counter(fields.next(), "halfmove-clock", 0)?;
        let fullmove_number = parse_counter(fields.next(), "fullmove-number", 1)?;

        Ok(Position {
            grid,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Serialize back to the six-field format
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(80);
        write_placement(&self.grid, &mut out);
        let side = match self.side_to_move {
            PieceColor::White => 'w',
            PieceColor::Black => 'b',
        };
        out.push(' ');
        out.push(side);
        out.push(' ');
        out.push_str(&self.castling.to_string());
        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

fn parse_counter(field: Option<&str>, name: &'static str, default: u32) -> CoreResult<u32> {
    match field {
        None => Ok(default),
        Some(f) => f.parse().map_err(|_| CoreError::BadField {
            field: name,
            value: f.to_string(),
        }),
    }
}

/// Expand a placement field into the explicit grid
///
/// Ranks arrive top-down (rank 8 first), the grid stores rank 0 first.
fn parse_placement(placement: &str) -> CoreResult<Grid> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(CoreError::BadRankCount { found: ranks.len() });
    }
    let mut grid: Grid = [[None; 8]; 8];
    for (i, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_text.chars() {
            if let Some(run) = c.to_digit(10) {
                if run == 0 || run > 8 {
                    return Err(CoreError::BadPlacementChar { c });
                }
                file += run as usize;
            } else {
                let piece = Piece::from_letter(c).ok_or(CoreError::BadPlacementChar { c })?;
                if file >= 8 {
                    return Err(CoreError::BadRankWidth { rank: 8 - i });
                }
                grid[rank][file] = Some(piece);
                file += 1;
            }
            if file > 8 {
                return Err(CoreError::BadRankWidth { rank: 8 - i });
            }
        }
        if file != 8 {
            return Err(CoreError::BadRankWidth { rank: 8 - i });
        }
    }
    Ok(grid)
}

/// Re-compress the grid into run-length placement text
fn write_placement(grid: &Grid, out: &mut String) {
    for rank in (0..8).rev() {
        if rank != 7 {
            out.push('/');
        }
        let mut empty_run = 0u8;
        for file in 0..8 {
            match grid[rank][file] {
                None => empty_run += 1,
                Some(piece) => {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(piece.letter());
                }
            }
        }
        if empty_run > 0 {
            out.push((b'0' + empty_run) as char);
        }
    }
}

/// Relocate the occupant of `from` to `to` in raw placement text
///
/// Whatever occupies `to` is overwritten; an empty `from` simply empties `to`
/// as well, which is what a free-mode "move nothing" gesture means. The
/// side-to-move, castling, en-passant and counter fields are carried through
/// verbatim, even when they are inconsistent with the new arrangement.
pub fn patch_square(fen_text: &str, from: Square, to: Square) -> CoreResult<String> {
    let mut fields = fen_text.split_whitespace();
    let placement = fields.next().ok_or(CoreError::BadRankCount { found: 0 })?;
    let mut grid = parse_placement(placement)?;

    let occupant = grid[from.rank() as usize][from.file() as usize].take();
    grid[to.rank() as usize][to.file() as usize] = occupant;

    let mut out = String::with_capacity(fen_text.len());
    write_placement(&grid, &mut out);
    for field in fields {
        out.push(' ');
        out.push_str(field);
    }
    Ok(out)
}
