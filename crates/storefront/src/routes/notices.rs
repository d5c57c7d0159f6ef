//! Notice queue route handler.

use axum::Json;
use bazaar_core::Notice;
use tower_sessions::Session;

use crate::error::Result;
use crate::services::notices;

/// Live notices, oldest first. Reading empties the queue.
pub async fn index(session: Session) -> Result<Json<Vec<Notice>>> {
    Ok(Json(notices::drain(&session).await?))
}
