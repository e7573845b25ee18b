use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use laurel_core::AppError;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

/// Verifies the bearer token and exposes the caller as a request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())?;
    let identity = state.credential_verifier.verify(token)?;

    debug!(subject = identity.subject(), "request authenticated");
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_owned()))?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthorized(
            "malformed authorization header".to_owned(),
        ));
    }

    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};
    use laurel_core::AppError;

    use super::bearer_token;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).ok(), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer  token ")).ok(), Some("token"));
    }

    #[test]
    fn missing_or_foreign_scheme_is_unauthorized() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&headers("Basic dXNlcjpwYXNz")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
