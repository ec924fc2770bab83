//! Opaque video-conference tokens
//!
//! Stand-in for the real RTC provider: tokens are random bytes plus the room
//! code, base64-encoded so the frontend can pass them through untouched. A
//! production deployment swaps this for the provider's signed-token SDK.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use liveboard_core::collab::TokenService;
use liveboard_core::error::CoreResult;
use rand::Rng;

#[derive(Default)]
pub struct StubTokenService;

impl TokenService for StubTokenService {
    fn video_token(&self, room_code: &str) -> CoreResult<String> {
        let nonce: [u8; 24] = rand::rng().random();
        let mut raw = Vec::with_capacity(room_code.len() + 1 + nonce.len());
        raw.extend_from_slice(room_code.as_bytes());
        raw.push(b'.');
        raw.extend_from_slice(&nonce);
        Ok(URL_SAFE_NO_PAD.encode(raw))
    }
}
