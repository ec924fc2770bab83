//! REST surface: room creation/join and the video token stub
//!
//! Everything stateful lives in [`AppState`]; the room registry is owned here
//! and handed to the WebSocket handler through the router state, never through
//! a process-wide singleton.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use liveboard_core::collab::TokenService;
use liveboard_core::protocol::Participant;
use serde::{Deserialize, Serialize};

use crate::rooms::RoomRegistry;
use crate::token::StubTokenService;
use crate::ws;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub tokens: Arc<StubTokenService>,
}

#[derive(Serialize)]
pub struct CreateRoomResponse {
    pub room_code: String,
}

#[derive(Deserialize)]
pub struct JoinRoomRequest {
    pub room_code: String,
}

#[derive(Serialize)]
pub struct JoinRoomResponse {
    pub room_code: String,
    pub participants: Vec<Participant>,
}

#[derive(Deserialize)]
pub struct VideoTokenRequest {
    pub room_code: String,
}

#[derive(Serialize)]
pub struct VideoTokenResponse {
    pub token: String,
}

pub fn router() -> Router {
    let state = AppState {
        registry: Arc::new(RoomRegistry::default()),
        tokens: Arc::new(StubTokenService::default()),
    };

    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/join", post(join_room))
        .route("/video/token", post(video_token))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

async fn create_room(State(state): State<AppState>) -> Json<CreateRoomResponse> {
    let room_code = state.registry.create();
    Json(CreateRoomResponse { room_code })
}

/// Confirm a room code before opening the socket; the socket `join` frame is
/// what actually seats the participant
async fn join_room(
    State(state): State<AppState>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, StatusCode> {
    let roster = state
        .registry
        .roster(&payload.room_code)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(JoinRoomResponse {
        room_code: payload.room_code,
        participants: roster,
    }))
}

async fn video_token(
    State(state): State<AppState>,
    Json(payload): Json<VideoTokenRequest>,
) -> Result<Json<VideoTokenResponse>, StatusCode> {
    if !state.registry.exists(&payload.room_code) {
        return Err(StatusCode::NOT_FOUND);
    }
    let token = state
        .tokens
        .video_token(&payload.room_code)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(VideoTokenResponse { token }))
}
