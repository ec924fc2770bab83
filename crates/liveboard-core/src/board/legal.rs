//! Rule-checked move application backed by `shakmaty`
//!
//! The classroom never implements chess rules itself: a board drag is matched
//! against the legal move list of the current position. A rejected drag is a
//! normal outcome, not an error, and a position that does not validate as
//! chess at all (wrong king count, pawns on the back rank) produces
//! [`RejectReason::NotWellFormed`] which is the trigger for the free-mode
//! fallback in [`crate::board::free`].
//!
//! Game text loading accepts numbered SAN move text with an optional embedded
//! `[FEN "..."]` tag, or a bare placement string. Undo never inverts a move:
//! it pops the record and replays the rest from the start position, so the
//! rebuilt position cannot drift from what the rules engine would produce.

use shakmaty::san::SanPlus;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, FromSetup as _, Move, Position as _, Role, Setup,
};

use crate::board::codec::Position;
use crate::board::types::{CastlingRights, Piece, PieceColor, PieceKind, Square};
use crate::error::{CoreError, CoreResult};

/// One applied move with its cached resulting position
///
/// `fen_after` is recorded at application time so history reconstruction stays
/// deterministic even if the rules backend changes underneath a live lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub san: String,
    pub fen_after: String,
}

/// Outcome of a rule-checked move attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied {
        record: MoveRecord,
        position: Position,
    },
    Rejected(RejectReason),
}

/// Why a move attempt was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The position is not valid chess; free mode is the only way to move here
    NotWellFormed,
    /// The position is fine but the move breaks the rules
    IllegalMove,
}

/// A game reconstructed from pasted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedGame {
    pub start: Position,
    pub moves: Vec<MoveRecord>,
}

/// Attempt a move under full chess rules
pub fn try_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> MoveOutcome {
    let chess = match to_chess(position) {
        Some(c) => c,
        None => return MoveOutcome::Rejected(RejectReason::NotWellFormed),
    };
    let sf = to_shakmaty_square(from);
    let st = to_shakmaty_square(to);
    let promo = promotion.map(to_role);

    let matched = chess
        .legal_moves()
        .iter()
        .find(|m| matches_drag(m, sf, st, promo))
        .cloned();
    let m = match matched {
        Some(m) => m,
        None => return MoveOutcome::Rejected(RejectReason::IllegalMove),
    };

    let san = SanPlus::from_move(chess.clone(), &m).to_string();
    let next = match chess.play(&m) {
        Ok(next) => next,
        // A move out of legal_moves() cannot fail to play; treat it as illegal
        // rather than panicking on a rules-backend surprise.
        Err(_) => return MoveOutcome::Rejected(RejectReason::IllegalMove),
    };
    let position = from_chess(&next);
    let record = MoveRecord {
        from,
        to,
        promotion,
        san,
        fen_after: position.to_fen(),
    };
    MoveOutcome::Applied { record, position }
}

/// Pop the last move and rebuild the position by replay from `start`
pub fn undo(start: &Position, moves: &mut Vec<MoveRecord>) -> CoreResult<Position> {
    moves.pop();
    replay(start, moves)
}

/// Replay recorded moves from `start`, failing if any step no longer applies
pub fn replay(start: &Position, moves: &[MoveRecord]) -> CoreResult<Position> {
    let mut position = start.clone();
    for (index, record) in moves.iter().enumerate() {
        match try_move(&position, record.from, record.to, record.promotion) {
            MoveOutcome::Applied { position: next, .. } => position = next,
            MoveOutcome::Rejected(_) => {
                return Err(CoreError::ReplayDiverged {
                    index,
                    san: record.san.clone(),
                })
            }
        }
    }
    Ok(position)
}

/// Load pasted game or position text
///
/// Move text with at least one legal SAN move wins; otherwise an embedded
/// `[FEN "..."]` tag is taken as a standalone position; otherwise the whole
/// text must parse as a placement string. The returned start position carries
/// no legality guarantee.
pub fn load_game_text(text: &str) -> CoreResult<LoadedGame> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::UnloadableText {
            reason: "empty input".to_string(),
        });
    }

    let (fen_tag, movetext) = split_off_tags(trimmed);
    let start = match &fen_tag {
        Some(tag) => Position::from_fen(tag)?,
        None => Position::start(),
    };

    let mut moves = Vec::new();
    if let Some(mut chess) = to_chess(&start) {
        for token in san_tokens(&movetext) {
            let san_plus = match SanPlus::from_ascii(token.as_bytes()) {
                Ok(sp) => sp,
                Err(_) => break,
            };
            let m = match san_plus.san.to_move(&chess) {
                Ok(m) => m,
                Err(_) => break,
            };
            let Some((from, to)) = drag_squares(&m) else {
                break;
            };
            let san = SanPlus::from_move(chess.clone(), &m).to_string();
            chess = match chess.play(&m) {
                Ok(next) => next,
                Err(_) => break,
            };
            moves.push(MoveRecord {
                from,
                to,
                promotion: m.promotion().map(from_role),
                san,
                fen_after: from_chess(&chess).to_fen(),
            });
        }
    }

    if moves.is_empty() && fen_tag.is_none() {
        // Not a game: the text itself has to be a position.
        let position = Position::from_fen(trimmed)?;
        return Ok(LoadedGame {
            start: position,
            moves,
        });
    }
    Ok(LoadedGame { start, moves })
}

/// Render a move list as numbered SAN text, for the game archive collaborator
pub fn movetext(start: &Position, moves: &[MoveRecord]) -> String {
    let mut out = String::new();
    let mut number = start.fullmove_number;
    let mut to_move = start.side_to_move;
    for record in moves {
        match to_move {
            PieceColor::White => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&format!("{number}. {}", record.san));
            }
            PieceColor::Black => {
                if out.is_empty() {
                    out.push_str(&format!("{number}... {}", record.san));
                } else {
                    out.push(' ');
                    out.push_str(&record.san);
                }
                number += 1;
            }
        }
        to_move = to_move.opposite();
    }
    out
}

/// Convert to a validated rules position; `None` means "not chess"
///
/// Stray castling/en-passant claims from setup tools are forgiven; king-count
/// and occupancy anomalies are not.
pub(crate) fn to_chess(position: &Position) -> Option<Chess> {
    let mut setup = Setup::empty();
    for rank in 0..8u8 {
        for file in 0..8u8 {
            let sq = Square::new(file, rank).expect("coords in range");
            if let Some(piece) = position.piece_at(sq) {
                setup
                    .board
                    .set_piece_at(to_shakmaty_square(sq), to_shakmaty_piece(piece));
            }
        }
    }
    setup.turn = match position.side_to_move {
        PieceColor::White => Color::White,
        PieceColor::Black => Color::Black,
    };
    for (flag, rook_sq) in [
        (CastlingRights::WHITE_KINGSIDE, shakmaty::Square::H1),
        (CastlingRights::WHITE_QUEENSIDE, shakmaty::Square::A1),
        (CastlingRights::BLACK_KINGSIDE, shakmaty::Square::H8),
        (CastlingRights::BLACK_QUEENSIDE, shakmaty::Square::A8),
    ] {
        if position.castling.contains(flag) {
            setup.castling_rights.add(rook_sq);
        }
    }
    setup.ep_square = position.en_passant.map(to_shakmaty_square);
    setup.halfmoves = position.halfmove_clock;
    setup.fullmoves = std::num::NonZeroU32::new(position.fullmove_number.max(1))
        .expect("max(1) is non-zero");

    Chess::from_setup(setup, CastlingMode::Standard)
        .or_else(|err| err.ignore_invalid_castling_rights())
        .or_else(|err| err.ignore_invalid_ep_square())
        .ok()
}

pub(crate) fn from_chess(chess: &Chess) -> Position {
    let mut position = Position::empty();
    let board = chess.board();
    for rank in 0..8u8 {
        for file in 0..8u8 {
            let sq = Square::new(file, rank).expect("coords in range");
            if let Some(piece) = board.piece_at(to_shakmaty_square(sq)) {
                position.set_piece(sq, Some(from_shakmaty_piece(piece)));
            }
        }
    }
    position.side_to_move = match chess.turn() {
        Color::White => PieceColor::White,
        Color::Black => PieceColor::Black,
    };
    let rights = chess.castles().castling_rights();
    for (flag, rook_sq) in [
        (CastlingRights::WHITE_KINGSIDE, shakmaty::Square::H1),
        (CastlingRights::WHITE_QUEENSIDE, shakmaty::Square::A1),
        (CastlingRights::BLACK_KINGSIDE, shakmaty::Square::H8),
        (CastlingRights::BLACK_QUEENSIDE, shakmaty::Square::A8),
    ] {
        if rights.contains(rook_sq) {
            position.castling.insert(flag);
        }
    }
    position.en_passant = chess
        .ep_square(EnPassantMode::Legal)
        .map(from_shakmaty_square);
    position.halfmove_clock = chess.halfmoves();
    position.fullmove_number = chess.fullmoves().get();
    position
}

/// Match a UI drag against a legal move, castling expressed as king-two-files
/// (e1-g1) or king-onto-rook (e1-h1)
fn matches_drag(
    m: &Move,
    from: shakmaty::Square,
    to: shakmaty::Square,
    promotion: Option<Role>,
) -> bool {
    match *m {
        Move::Castle { king, rook } => {
            let side_file = if rook.file() > king.file() {
                shakmaty::File::G
            } else {
                shakmaty::File::C
            };
            let king_to = shakmaty::Square::from_coords(side_file, king.rank());
            from == king && (to == king_to || to == rook)
        }
        _ => m.from() == Some(from) && m.to() == to && m.promotion() == promotion,
    }
}

/// The (from, to) a UI would show for a legal move
fn drag_squares(m: &Move) -> Option<(Square, Square)> {
    match *m {
        Move::Castle { king, rook } => {
            let side_file = if rook.file() > king.file() {
                shakmaty::File::G
            } else {
                shakmaty::File::C
            };
            let king_to = shakmaty::Square::from_coords(side_file, king.rank());
            Some((from_shakmaty_square(king), from_shakmaty_square(king_to)))
        }
        _ => Some((from_shakmaty_square(m.from()?), from_shakmaty_square(m.to()))),
    }
}

fn to_shakmaty_square(sq: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        shakmaty::File::new(u32::from(sq.file())),
        shakmaty::Rank::new(u32::from(sq.rank())),
    )
}

fn from_shakmaty_square(sq: shakmaty::Square) -> Square {
    Square::new(u32::from(sq.file()) as u8, u32::from(sq.rank()) as u8)
        .expect("shakmaty squares are in range")
}

fn to_role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn to_shakmaty_piece(piece: Piece) -> shakmaty::Piece {
    shakmaty::Piece {
        color: match piece.color {
            PieceColor::White => Color::White,
            PieceColor::Black => Color::Black,
        },
        role: to_role(piece.kind),
    }
}

fn from_shakmaty_piece(piece: shakmaty::Piece) -> Piece {
    Piece {
        color: match piece.color {
            Color::White => PieceColor::White,
            Color::Black => PieceColor::Black,
        },
        kind: from_role(piece.role),
    }
}

/// Pull `[Tag "Value"]` pairs off the text, keeping the FEN tag value
fn split_off_tags(text: &str) -> (Option<String>, String) {
    let mut fen_tag = None;
    let mut rest = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' {
            let mut tag = String::new();
            let mut in_quotes = false;
            for t in chars.by_ref() {
                if t == '"' {
                    in_quotes = !in_quotes;
                }
                if t == ']' && !in_quotes {
                    break;
                }
                tag.push(t);
            }
            if let Some(value) = tag.strip_prefix("FEN") {
                let value = value.trim().trim_matches('"');
                if !value.is_empty() {
                    fen_tag = Some(value.to_string());
                }
            }
        } else {
            rest.push(c);
        }
    }
    (fen_tag, rest)
}

/// Iterate SAN candidates: comments, variations, numbering, NAGs and results
/// are dropped
fn san_tokens(movetext: &str) -> Vec<String> {
    let mut filtered = String::with_capacity(movetext.len());
    let mut in_comment = false;
    let mut variation_depth = 0u32;
    for c in movetext.chars() {
        match c {
            '{' => in_comment = true,
            '}' => in_comment = false,
            '(' if !in_comment => variation_depth += 1,
            ')' if !in_comment => variation_depth = variation_depth.saturating_sub(1),
            _ if !in_comment && variation_depth == 0 => filtered.push(c),
            _ => {}
        }
    }

    filtered
        .split_whitespace()
        .filter_map(|raw| {
            // "12.", "12...", "12.e4" -> "e4"
            let token = raw
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches('.');
            let token = token.trim_end_matches(['!', '?']);
            if token.is_empty() || token.starts_with('$') {
                return None;
            }
            if matches!(raw, "1-0" | "0-1" | "1/2-1/2" | "*") {
                return None;
            }
            Some(token.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::codec::START_FEN;

    fn sq(name: &str) -> Square {
        name.parse().expect("valid square")
    }

    #[test]
    fn legal_pawn_push_applies() {
        let start = Position::start();
        match try_move(&start, sq("e2"), sq("e4"), None) {
            MoveOutcome::Applied { record, position } => {
                assert_eq!(record.san, "e4");
                assert_eq!(
                    position.to_fen(),
                    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
                );
                assert_eq!(record.fen_after, position.to_fen());
            }
            other => panic!("expected applied move, got {other:?}"),
        }
    }

    #[test]
    fn illegal_move_is_a_rejection_value() {
        let start = Position::start();
        assert_eq!(
            try_move(&start, sq("e2"), sq("e5"), None),
            MoveOutcome::Rejected(RejectReason::IllegalMove)
        );
        // Moving the opponent's piece is just as illegal.
        assert_eq!(
            try_move(&start, sq("e7"), sq("e5"), None),
            MoveOutcome::Rejected(RejectReason::IllegalMove)
        );
    }

    #[test]
    fn kingless_position_is_not_well_formed() {
        let bare = Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(
            try_move(&bare, sq("a1"), sq("a2"), None),
            MoveOutcome::Rejected(RejectReason::NotWellFormed)
        );
        let two_kings = Position::from_fen("8/8/8/8/8/8/8/KK5k w - - 0 1").unwrap();
        assert_eq!(
            try_move(&two_kings, sq("a1"), sq("a2"), None),
            MoveOutcome::Rejected(RejectReason::NotWellFormed)
        );
    }

    #[test]
    fn self_check_is_rejected() {
        let pinned = Position::from_fen("4r2k/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert_eq!(
            try_move(&pinned, sq("e2"), sq("d3"), None),
            MoveOutcome::Rejected(RejectReason::IllegalMove)
        );
    }

    #[test]
    fn castling_matches_king_two_file_drag() {
        let ready =
            Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        match try_move(&ready, sq("e1"), sq("g1"), None) {
            MoveOutcome::Applied { record, .. } => assert_eq!(record.san, "O-O"),
            other => panic!("expected castling, got {other:?}"),
        }
    }

    #[test]
    fn promotion_requires_matching_piece() {
        let about_to_promote = Position::from_fen("8/P7/8/8/8/8/k7/2K5 w - - 0 1").unwrap();
        match try_move(
            &about_to_promote,
            sq("a7"),
            sq("a8"),
            Some(PieceKind::Queen),
        ) {
            MoveOutcome::Applied { record, .. } => assert_eq!(record.san, "a8=Q+"),
            other => panic!("expected promotion, got {other:?}"),
        }
        assert_eq!(
            try_move(&about_to_promote, sq("a7"), sq("a8"), None),
            MoveOutcome::Rejected(RejectReason::IllegalMove)
        );
    }

    #[test]
    fn stray_castling_rights_do_not_break_wellformedness() {
        // Rooks are gone but the rights field still claims them.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert!(to_chess(&pos).is_some());
    }

    #[test]
    fn loads_numbered_movetext() {
        let game = load_game_text("1. e4 e5 2. Nf3").expect("loads");
        assert_eq!(game.start, Position::start());
        assert_eq!(game.moves.len(), 3);
        assert_eq!(game.moves[0].san, "e4");
        assert_eq!(game.moves[2].san, "Nf3");
    }

    #[test]
    fn loads_movetext_with_tags_comments_and_result() {
        let text = r#"[Event "Lesson"]
[FEN "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"]

1. d4 {queen's pawn} d5 (1... Nf6 2. c4) 2. c4! dxc4 1-0"#;
        let game = load_game_text(text).expect("loads");
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.moves[3].san, "dxc4");
    }

    #[test]
    fn partial_movetext_keeps_the_legal_prefix() {
        let game = load_game_text("1. e4 e5 2. Qxf7").expect("loads");
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn fen_tag_without_moves_loads_as_standalone_position() {
        let text = r#"[FEN "8/8/8/8/8/8/8/8 w - - 0 1"]"#;
        let game = load_game_text(text).expect("loads");
        assert!(game.moves.is_empty());
        assert_eq!(game.start.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn bare_fen_loads_as_position() {
        let game = load_game_text(START_FEN).expect("loads");
        assert!(game.moves.is_empty());
        assert_eq!(game.start, Position::start());
    }

    #[test]
    fn garbage_is_unloadable() {
        assert!(load_game_text("").is_err());
        assert!(load_game_text("this is not chess").is_err());
    }

    #[test]
    fn undo_replays_from_start() {
        let start = Position::start();
        let mut moves = load_game_text("1. e4 e5 2. Nf3").unwrap().moves;
        let position = undo(&start, &mut moves).expect("replay succeeds");
        assert_eq!(moves.len(), 2);
        assert_eq!(
            position.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        // Undoing everything lands back on the start position.
        let position = undo(&start, &mut moves).and_then(|_| {
            moves.clear();
            replay(&start, &moves)
        });
        assert_eq!(position.unwrap(), start);
    }

    #[test]
    fn movetext_renders_numbered_san() {
        let game = load_game_text("1. e4 e5 2. Nf3").unwrap();
        assert_eq!(movetext(&game.start, &game.moves), "1. e4 e5 2. Nf3");
    }

    #[test]
    fn roundtrip_through_codec_after_each_move() {
        let game = load_game_text("1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6").unwrap();
        for record in &game.moves {
            let parsed = Position::from_fen(&record.fen_after).expect("cached fen parses");
            assert_eq!(parsed.to_fen(), record.fen_after);
        }
    }
}
