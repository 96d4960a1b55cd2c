use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::AppState;

/// Middleware: Authenticates the request using a Bearer token.
/// The only accepted token is the configured API token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req.headers().get(header::AUTHORIZATION);

    let token = match auth_header {
        Some(value) => {
            let value_str = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
            value_str
                .strip_prefix("Bearer ")
                .ok_or(StatusCode::UNAUTHORIZED)?
                .to_string()
        }
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    if token == state.api_token {
        Ok(next.run(req).await)
    } else {
        warn!("Invalid Bearer token provided");
        Err(StatusCode::UNAUTHORIZED)
    }
}
