//! Session-backed notice queue.

use bazaar_core::{Notice, Notices};
use chrono::Utc;
use tower_sessions::Session;

use crate::models::session_keys;

use super::{load, store};

/// Queue a success notice (visible for 3 seconds).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn success(
    session: &Session,
    text: impl Into<String> + Send,
) -> Result<(), tower_sessions::session::Error> {
    let mut notices: Notices = load(session, session_keys::NOTICES).await?;
    notices.success(text, Utc::now());
    store(session, session_keys::NOTICES, &notices).await
}

/// Queue an error notice (visible for 4 seconds).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn error(
    session: &Session,
    text: impl Into<String> + Send,
) -> Result<(), tower_sessions::session::Error> {
    let mut notices: Notices = load(session, session_keys::NOTICES).await?;
    notices.error(text, Utc::now());
    store(session, session_keys::NOTICES, &notices).await
}

/// Take the live notices and empty the queue.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn drain(session: &Session) -> Result<Vec<Notice>, tower_sessions::session::Error> {
    let mut notices: Notices = load(session, session_keys::NOTICES).await?;
    if notices.is_empty() {
        return Ok(Vec::new());
    }
    let live = notices.drain_live(Utc::now());
    session.remove_value(session_keys::NOTICES).await?;
    Ok(live)
}
