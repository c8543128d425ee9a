use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::observability::RequestSpan;
use super::{AdminDto, ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::AdminIdentity;
use crate::services::AuthError;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

/// Identity resolved by [`auth_middleware`] for the current request.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub AdminIdentity);

// ============================================================================
// Middleware
// ============================================================================

/// Gate for every protected route: the bearer token must map to a live
/// session. Nothing client-held is trusted beyond the token itself.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers());

    let identity = state.auth().validate(token.as_deref()).await?;

    if let Some(span) = request.extensions().get::<RequestSpan>() {
        span.record_user(identity.id);
    }
    request.extensions_mut().insert(CurrentAdmin(identity));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let (scheme, token) = auth_header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let issued = state
        .auth()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        username: issued.username,
    })))
}

/// POST /auth/logout
/// Revoke the session named by the bearer token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let token = extract_bearer_token(&headers).ok_or(AuthError::SessionInvalid)?;

    state.auth().logout(&token).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}

/// GET /auth/me
/// Get current admin information (requires authentication)
pub async fn get_current_user(
    Extension(CurrentAdmin(identity)): Extension<CurrentAdmin>,
) -> Json<ApiResponse<AdminDto>> {
    Json(ApiResponse::success(AdminDto::from(identity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc123")).as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_bearer_token(&headers_with("bearer  abc123 ")).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_shapes() {
        assert!(extract_bearer_token(&HeaderMap::new()).is_none());
        assert!(extract_bearer_token(&headers_with("Basic YWRtaW46YWRtaW4=")).is_none());
        assert!(extract_bearer_token(&headers_with("Bearer")).is_none());
        assert!(extract_bearer_token(&headers_with("Bearer    ")).is_none());
        assert!(extract_bearer_token(&headers_with("abc123")).is_none());
    }
}
