//! Lesson room state and the controller that keeps it synchronized
//!
//! A [`RoomController`] owns the authoritative local copy of one lesson room
//! and the [`SyncChannel`] it broadcasts on; it is constructed on room join
//! and torn down on leave, so there is no process-wide channel state. Local
//! actions apply optimistically and immediately, then broadcast; inbound
//! events are reconciled through the same state transitions, which makes the
//! sender's own echoes harmless.
//!
//! The controller never blocks: every engine computation is O(board), and all
//! channel sends are fire-and-forget.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::annotations::AnnotationLayer;
use crate::board::codec::Position;
use crate::board::free::{free_move, FreeMoveOutcome};
use crate::board::legal::{self, LoadedGame, MoveOutcome, MoveRecord, RejectReason};
use crate::board::mode::EngineMode;
use crate::board::types::{PieceKind, Square};
use crate::error::{CoreError, CoreResult};
use crate::history::{self, HistoryCursor, LIVE_INDEX};
use crate::playlist::{Chapter, Playlist};
use crate::protocol::{Participant, ServerMessage, SyncEvent};

/// Outbound half of the room's event bus
///
/// Implemented by whatever transport carries events to the relay; tests use
/// plain collections. Sends are fire-and-forget: local state is already
/// updated by the time an event leaves.
pub trait SyncChannel {
    fn send(&mut self, event: SyncEvent) -> CoreResult<()>;
}

/// Capture channel for tests and dry runs
impl SyncChannel for Vec<SyncEvent> {
    fn send(&mut self, event: SyncEvent) -> CoreResult<()> {
        self.push(event);
        Ok(())
    }
}

impl SyncChannel for std::sync::mpsc::Sender<SyncEvent> {
    fn send(&mut self, event: SyncEvent) -> CoreResult<()> {
        std::sync::mpsc::Sender::send(self, event).map_err(|_| CoreError::ChannelClosed)
    }
}

/// The authoritative position, legal or raw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivePosition {
    Legal(Position),
    /// Placement text that does not validate as chess; kept verbatim
    Raw(String),
}

impl LivePosition {
    pub fn fen(&self) -> String {
        match self {
            LivePosition::Legal(position) => position.to_fen(),
            LivePosition::Raw(text) => text.clone(),
        }
    }

    pub fn to_position(&self) -> CoreResult<Position> {
        match self {
            LivePosition::Legal(position) => Ok(position.clone()),
            LivePosition::Raw(text) => Position::from_fen(text),
        }
    }
}

/// Transport health, shown as a room status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    /// The channel dropped; state is kept and the next broadcast after a
    /// rejoin reconverges
    Disconnected,
}

/// One chat line in the room log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub text: String,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
}

/// What happened to a local board drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMoveOutcome {
    /// Applied and broadcast
    Applied,
    /// Illegal under chess rules; the UI snaps the piece back
    RejectedByRules,
    /// Free mode is off on a non-chess position; surface the strict-mode
    /// notice
    StrictModeBlocked,
}

/// Shared state of one lesson room, as this client sees it
#[derive(Debug, Clone)]
pub struct Room {
    code: String,
    roster: Vec<Participant>,
    start: Position,
    live: LivePosition,
    mode: EngineMode,
    free_move_enabled: bool,
    moves: Vec<MoveRecord>,
    annotations: AnnotationLayer,
    chat: Vec<ChatEntry>,
    playlist: Option<Playlist>,
    history: HistoryCursor,
    status: ConnectionStatus,
    last_notice: Option<String>,
}

impl Room {
    fn new(code: String) -> Self {
        Room {
            code,
            roster: Vec::new(),
            start: Position::start(),
            live: LivePosition::Legal(Position::start()),
            mode: EngineMode::Legal,
            free_move_enabled: false,
            moves: Vec::new(),
            annotations: AnnotationLayer::new(),
            chat: Vec::new(),
            playlist: None,
            history: HistoryCursor::new(),
            status: ConnectionStatus::Connected,
            last_notice: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    pub fn live_fen(&self) -> String {
        self.live.fen()
    }

    pub fn start_position(&self) -> &Position {
        &self.start
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn annotations(&self) -> &AnnotationLayer {
        &self.annotations
    }

    pub fn chat(&self) -> &[ChatEntry] {
        &self.chat
    }

    pub fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    pub fn free_move_enabled(&self) -> bool {
        self.free_move_enabled
    }

    pub fn history_index(&self) -> isize {
        self.history.index()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Last user-visible notice (strict mode, relay errors); cleared on read
    pub fn take_notice(&mut self) -> Option<String> {
        self.last_notice.take()
    }
}

/// Drives one participant's view of a lesson room
pub struct RoomController<C: SyncChannel> {
    me: Participant,
    room: Room,
    channel: C,
}

impl<C: SyncChannel> RoomController<C> {
    /// Join a room at the standard start position
    pub fn new(code: impl Into<String>, me: Participant, channel: C) -> Self {
        let mut room = Room::new(code.into());
        room.roster.push(me.clone());
        RoomController { me, room, channel }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn participant(&self) -> &Participant {
        &self.me
    }

    /// The outbound channel; transports and tests drain or swap it here
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn set_free_move(&mut self, enabled: bool) {
        self.room.free_move_enabled = enabled;
    }

    /// Last user-visible notice (strict mode, relay errors); cleared on read
    pub fn take_notice(&mut self) -> Option<String> {
        self.room.take_notice()
    }

    // ---- local board actions ----

    /// A drag/click move by the local user
    pub fn local_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> CoreResult<LocalMoveOutcome> {
        match self.room.mode {
            EngineMode::Legal => {
                let position = self.room.live.to_position()?;
                match legal::try_move(&position, from, to, promotion) {
                    MoveOutcome::Applied { record, position } => {
                        self.room.annotations.clear();
                        let fen = record.fen_after.clone();
                        self.room.live = LivePosition::Legal(position);
                        self.room.moves.push(record);
                        self.channel.send(SyncEvent::Move {
                            from,
                            to,
                            promotion,
                            fen,
                        })?;
                        Ok(LocalMoveOutcome::Applied)
                    }
                    MoveOutcome::Rejected(RejectReason::IllegalMove) => {
                        Ok(LocalMoveOutcome::RejectedByRules)
                    }
                    MoveOutcome::Rejected(RejectReason::NotWellFormed) => self.free_path(from, to),
                }
            }
            EngineMode::Free => self.free_path(from, to),
        }
    }

    fn free_path(&mut self, from: Square, to: Square) -> CoreResult<LocalMoveOutcome> {
        let current = self.room.live.fen();
        match free_move(&current, from, to, self.room.free_move_enabled)? {
            FreeMoveOutcome::Applied { fen } => {
                self.adopt_override(&fen)?;
                self.channel.send(SyncEvent::PositionOverride { fen })?;
                Ok(LocalMoveOutcome::Applied)
            }
            FreeMoveOutcome::StrictModeBlocked => {
                self.room.last_notice =
                    Some("Strict mode: enable free movement to edit this position".to_string());
                Ok(LocalMoveOutcome::StrictModeBlocked)
            }
        }
    }

    /// Take back the last move and broadcast the rebuilt position
    pub fn undo(&mut self) -> CoreResult<()> {
        if self.room.moves.is_empty() {
            return Ok(());
        }
        let position = legal::undo(&self.room.start, &mut self.room.moves)?;
        let fen = position.to_fen();
        self.room.live = LivePosition::Legal(position);
        self.room.annotations.clear();
        self.channel.send(SyncEvent::PositionOverride { fen })?;
        Ok(())
    }

    /// Load pasted position or game text and broadcast the result
    pub fn load_text(&mut self, text: &str) -> CoreResult<()> {
        let game = legal::load_game_text(text)?;
        self.adopt_game(game)?;
        let fen = self.room.live.fen();
        self.channel.send(SyncEvent::PositionOverride { fen })?;
        Ok(())
    }

    // ---- playlist ----

    /// Attach a chapter list without loading anything yet
    pub fn set_playlist(&mut self, chapters: Vec<Chapter>) {
        self.room.playlist = Some(Playlist::new(chapters));
    }

    /// Load chapter `index`; out-of-range or missing playlist is a no-op
    pub fn load_chapter(&mut self, index: usize) -> CoreResult<bool> {
        let source = match self.room.playlist.as_mut().and_then(|p| p.select(index)) {
            Some(chapter) => chapter.source.clone(),
            None => return Ok(false),
        };
        self.load_text(&source)?;
        Ok(true)
    }

    /// Advance to the next chapter; a no-op at the end of the playlist
    pub fn next_chapter(&mut self) -> CoreResult<bool> {
        let source = match self.room.playlist.as_mut().and_then(Playlist::next) {
            Some(chapter) => chapter.source.clone(),
            None => return Ok(false),
        };
        self.load_text(&source)?;
        Ok(true)
    }

    /// Step back one chapter; a no-op at the start of the playlist
    pub fn previous_chapter(&mut self) -> CoreResult<bool> {
        let source = match self.room.playlist.as_mut().and_then(Playlist::previous) {
            Some(chapter) => chapter.source.clone(),
            None => return Ok(false),
        };
        self.load_text(&source)?;
        Ok(true)
    }

    // ---- annotations ----

    pub fn cycle_mark(&mut self, square: Square) -> CoreResult<()> {
        self.room.annotations.cycle_mark(square);
        self.sync_annotations()
    }

    pub fn toggle_arrow(&mut self, from: Square, to: Square) -> CoreResult<()> {
        self.room.annotations.toggle_arrow(from, to);
        self.sync_annotations()
    }

    /// Right-drag release; same-square drags cycle the highlight instead
    pub fn annotate_release(&mut self, from: Square, to: Square) -> CoreResult<()> {
        self.room.annotations.pointer_release(from, to);
        self.sync_annotations()
    }

    pub fn clear_annotations(&mut self) -> CoreResult<()> {
        self.room.annotations.clear();
        self.sync_annotations()
    }

    fn sync_annotations(&mut self) -> CoreResult<()> {
        self.channel.send(SyncEvent::AnnotationSync {
            snapshot: self.room.annotations.snapshot(),
        })
    }

    // ---- chat ----

    /// Append locally for immediate feedback, then broadcast; the relay does
    /// not echo chat back to us
    pub fn send_chat(&mut self, text: impl Into<String>) -> CoreResult<()> {
        let entry = ChatEntry {
            text: text.into(),
            sender_id: self.me.id,
            sender_name: self.me.name.clone(),
            timestamp: Utc::now(),
        };
        self.room.chat.push(entry.clone());
        self.channel.send(SyncEvent::ChatMessage {
            text: entry.text,
            sender_id: entry.sender_id,
            sender_name: entry.sender_name,
            timestamp: entry.timestamp,
        })
    }

    // ---- history ----

    /// View a historical half-move; -1 resumes live play
    pub fn view_history(&mut self, index: isize) -> CoreResult<Position> {
        self.room.history.seek(index, self.room.moves.len())?;
        self.position_at(index)
    }

    pub fn resume_live(&mut self) {
        self.room.history.resume();
    }

    /// Position at a history index without moving the cursor
    pub fn position_at(&self, index: isize) -> CoreResult<Position> {
        if index == LIVE_INDEX {
            return self.room.live.to_position();
        }
        history::position_at(&self.room.start, &self.room.moves, index)
    }

    // ---- inbound ----

    /// Reconcile one server frame
    pub fn apply_server(&mut self, message: ServerMessage) -> CoreResult<()> {
        match message {
            ServerMessage::Joined { room, roster } => {
                self.room.code = room;
                self.room.roster = roster;
                self.room.status = ConnectionStatus::Connected;
                Ok(())
            }
            ServerMessage::PeerJoined { participant } => {
                if !self.room.roster.iter().any(|p| p.id == participant.id) {
                    self.room.roster.push(participant);
                }
                Ok(())
            }
            ServerMessage::PeerLeft { participant_id } => {
                self.room.roster.retain(|p| p.id != participant_id);
                Ok(())
            }
            ServerMessage::Event { event } => self.apply_remote(event),
            ServerMessage::Error { message } => {
                tracing::warn!(room = %self.room.code, %message, "room relay error");
                self.room.last_notice = Some(message);
                Ok(())
            }
        }
    }

    /// Reconcile one room event, our own echoes included
    pub fn apply_remote(&mut self, event: SyncEvent) -> CoreResult<()> {
        match event {
            SyncEvent::Move {
                from,
                to,
                promotion,
                fen,
            } => self.apply_remote_move(from, to, promotion, fen),
            SyncEvent::PositionOverride { fen } => self.adopt_override(&fen),
            SyncEvent::AnnotationSync { snapshot } => {
                self.room.annotations.replace(&snapshot);
                Ok(())
            }
            SyncEvent::ChatMessage {
                text,
                sender_id,
                sender_name,
                timestamp,
            } => {
                self.room.chat.push(ChatEntry {
                    text,
                    sender_id,
                    sender_name,
                    timestamp,
                });
                Ok(())
            }
        }
    }

    fn apply_remote_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
        fen: String,
    ) -> CoreResult<()> {
        // Our own echo: position and last move already match, nothing to do.
        if self.room.live.fen() == fen {
            if let Some(last) = self.room.moves.last() {
                if last.from == from && last.to == to && last.promotion == promotion {
                    return Ok(());
                }
            }
        }

        self.room.annotations.clear();

        // Prefer a rules replay so the record carries proper SAN; fall back to
        // trusting the payload FEN, which fully determines the next state.
        if let LivePosition::Legal(position) = &self.room.live {
            if let MoveOutcome::Applied { record, position } =
                legal::try_move(position, from, to, promotion)
            {
                if record.fen_after == fen {
                    self.room.live = LivePosition::Legal(position);
                    self.room.moves.push(record);
                    return Ok(());
                }
            }
        }

        let position = Position::from_fen(&fen)?;
        let san = format!("{from}{to}");
        self.room.moves.push(MoveRecord {
            from,
            to,
            promotion,
            san,
            fen_after: fen.clone(),
        });
        self.room.live = match EngineMode::for_position(&position) {
            EngineMode::Legal => {
                self.room.mode = EngineMode::Legal;
                LivePosition::Legal(position)
            }
            EngineMode::Free => {
                self.room.mode = EngineMode::Free;
                LivePosition::Raw(fen)
            }
        };
        Ok(())
    }

    /// Adopt a full-position replacement: mode re-evaluated, move list and
    /// annotations reset, history snapped back to live
    fn adopt_override(&mut self, fen: &str) -> CoreResult<()> {
        // Our own echo, or an override that changes nothing: leave the move
        // list and annotations alone.
        if self.room.live.fen() == fen {
            return Ok(());
        }
        let position = Position::from_fen(fen)?;
        self.room.mode = EngineMode::for_position(&position);
        self.room.live = match self.room.mode {
            EngineMode::Legal => LivePosition::Legal(position.clone()),
            EngineMode::Free => LivePosition::Raw(fen.to_string()),
        };
        self.room.start = position;
        self.room.moves.clear();
        self.room.annotations.clear();
        self.room.history.resume();
        Ok(())
    }

    /// Adopt a locally loaded game (chapter or pasted text)
    fn adopt_game(&mut self, game: LoadedGame) -> CoreResult<()> {
        let position = match game.moves.last() {
            Some(last) => Position::from_fen(&last.fen_after)?,
            None => game.start.clone(),
        };
        self.room.mode = EngineMode::for_position(&position);
        self.room.live = match self.room.mode {
            EngineMode::Legal => LivePosition::Legal(position.clone()),
            EngineMode::Free => LivePosition::Raw(position.to_fen()),
        };
        self.room.start = game.start;
        self.room.moves = game.moves;
        self.room.annotations.clear();
        self.room.history.resume();
        Ok(())
    }

    // ---- connection status ----

    /// The transport dropped; keep all state and wait for a rejoin
    pub fn mark_disconnected(&mut self) {
        self.room.status = ConnectionStatus::Disconnected;
    }

    /// Move-list text for the game archive collaborator
    pub fn movetext(&self) -> String {
        legal::movetext(&self.room.start, &self.room.moves)
    }
}
