//! Collaborator seams
//!
//! The classroom core talks to three external services, all of them out of
//! scope here: the syllabus content service that authors chapters, the game
//! archive invoked explicitly on game-over, and the RTC token service for the
//! video embed. These traits are the whole contract; the backend ships a stub
//! token issuer and tests use in-memory fakes.

use crate::error::CoreResult;
use crate::playlist::Chapter;

/// Chapter content authored by the external syllabus service
pub trait SyllabusService {
    fn chapters(&self, course_id: &str, level: u32) -> CoreResult<Vec<Chapter>>;
}

/// Explicit "save game" collaborator; no session persistence happens here
pub trait GameArchiveService {
    fn save(&self, room_code: &str, movetext: &str, result: &str) -> CoreResult<()>;
}

/// Token fetch for the external video conference; the media transport itself
/// never touches this crate
pub trait TokenService {
    fn video_token(&self, room_code: &str) -> CoreResult<String>;
}
