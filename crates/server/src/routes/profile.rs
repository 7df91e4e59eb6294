//! Profile route.

use axum::{Json, extract::State};
use serde_json::value::RawValue;

use crate::error::Result;
use crate::middleware::{AuthSession, RequireAuth};
use crate::state::AppState;

/// Return the signed-in user's profile rows.
///
/// The body is the store's row list exactly as it answered: `[]` when the
/// user has no profile, one element otherwise. The store is never queried
/// for an anonymous request.
///
/// # Route
///
/// `GET /profile`
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Box<RawValue>>> {
    let token = session.access_token().await?;
    let rows = state.profiles().find_by_id(&user.id, token.as_ref()).await?;

    tracing::debug!(user_id = %user.id, "Profile fetched");

    Ok(Json(rows))
}
