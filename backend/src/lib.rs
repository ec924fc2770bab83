//! Lesson-room relay server
//!
//! Thin fan-out layer over [`liveboard_core`]: rooms are in-memory broadcast
//! channels, participants connect over a WebSocket, and the relay forwards
//! classroom events without interpreting them. Board rules, annotations and
//! history all live on the clients.

pub mod api;
pub mod rooms;
pub mod token;
pub mod ws;
