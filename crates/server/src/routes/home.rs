//! Index route.

use axum::Json;

use super::MessageResponse;
use crate::messages;
use crate::middleware::OptionalAuth;

/// Greet the signed-in user, or invite an anonymous visitor to log in.
///
/// # Route
///
/// `GET /`
pub async fn index(OptionalAuth(user): OptionalAuth) -> Json<MessageResponse> {
    let message = user.map_or_else(
        || messages::INDEX_ANONYMOUS.to_string(),
        |user| messages::welcome(user.email.as_str()),
    );
    Json(MessageResponse::new(message))
}
