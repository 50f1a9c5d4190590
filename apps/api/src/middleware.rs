use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chatgate_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Rejects requests whose `authorization` header does not contain the admin token.
pub async fn require_admin_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(state.admin_token.as_str()));

    if !authorized {
        tracing::warn!("monitoring request rejected: missing or invalid admin token");
        return Err(AppError::Unauthorized("admin token required".to_owned()).into());
    }

    Ok(next.run(request).await)
}
