//! Authenticated caller extraction.
//!
//! Authentication happens upstream: the gateway verifies the caller and
//! forwards its username in a header (`x-forwarded-user` by default). This
//! middleware only reads that header:
//! 1. Look up the configured header on the request
//! 2. Reject the request with HTTP 401 if it is missing or blank
//! 3. Inject an [`Actor`] into the request extensions

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Username of the authenticated caller.
///
/// Recorded with processor calls for audit. Not used for authorization.
#[derive(Debug, Clone)]
pub struct Actor(pub String);

/// Middleware function requiring an authenticated caller.
///
/// # Returns
///
/// - `Ok(Response)` when the header is present (calls next handler)
/// - `Err(AppError::Unauthenticated)` otherwise (returns 401)
pub async fn require_actor(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let username = request
        .headers()
        .get(state.actor_header.as_str())
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(AppError::Unauthenticated)?
        .to_string();

    // Route handlers can now extract this using Extension<Actor>
    request.extensions_mut().insert(Actor(username));

    Ok(next.run(request).await)
}
