use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    auth::Principal,
    error::{AppError, Result},
};

#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub principal: Principal,
}

/// Pulls the token out of `Authorization: Bearer <token>`.
/// `Ok(None)` means the header is absent.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    Ok(Some(token))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal> {
    let token = bearer_token(headers)?
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    state.verifier.verify(token)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = authenticate(&state, request.headers())?;
    request.extensions_mut().insert(CurrentUser { principal });

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let principal = authenticate(&state, request.headers())?;
    if !principal.is_admin() {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    request.extensions_mut().insert(CurrentUser { principal });

    Ok(next.run(request).await)
}

/// Attaches the caller when a valid token is present; anonymous otherwise.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(principal) => {
            request.extensions_mut().insert(CurrentUser { principal });
        }
        Err(e) => {
            if request.headers().contains_key(AUTHORIZATION) {
                tracing::debug!("Ignoring unusable bearer token: {}", e);
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_not_an_error_by_itself() {
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn bearer_prefix_is_required() {
        let err = bearer_token(&headers("Token abc")).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid authorization header");
        assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), Some("abc"));
    }

    #[test]
    fn empty_bearer_is_rejected() {
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }
}
