use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use crate::database::error::ApiError;

use super::jwt::{verify_jwt_session, SessionData};

/// Accepts `Token <jwt>` (the scheme the identity service hands out) and `Bearer <jwt>`.
fn extract_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    match scheme {
        "Token" | "Bearer" if !token.trim().is_empty() => Some(token.trim()),
        _ => None,
    }
}

fn authenticate(header: &str, secret: &str) -> Result<SessionData, ApiError> {
    let token = extract_token(header).ok_or(ApiError::InvalidToken)?;
    verify_jwt_session(token, secret).map(SessionData::from)
}

/// Requires a valid identity.
pub fn with_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move {
            let header = header.ok_or(ApiError::Unauthorized)?;
            authenticate(&header, &secret).map_err(Rejection::from)
        }
    })
}

/// Allows anonymous callers, but a credential that is present must be valid.
pub fn with_possible_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let secret = secret.clone();
        async move {
            match header {
                Some(header) => authenticate(&header, &secret)
                    .map(Some)
                    .map_err(Rejection::from),
                None => Ok(None),
            }
        }
    })
}
