use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::error::{ApiError, ApiResult};
use crate::database::schema::Id;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }
}

/// The authenticated identity threaded through every operation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

fn signing_key(secret: &str) -> ApiResult<Hmac<Sha256>> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|e| ApiError::Token(e.to_string()))
}

/// Issues a token the way the identity service does. Used by that service and by tests.
pub fn generate_jwt_session(
    user_id: Id,
    username: &str,
    lifetime: Duration,
    secret: &str,
) -> ApiResult<String> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user_id, username.to_owned(), lifetime);

    claims
        .sign_with_key(&key)
        .map_err(|e| ApiError::Token(e.to_string()))
}

pub fn verify_jwt_session(token: &str, secret: &str) -> ApiResult<JwtSessionData> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ApiError::InvalidToken)?;

    if (session.exp - Utc::now().timestamp()).is_negative() {
        log::trace!("> Rejected expired session of user {}", session.user_id);
        return Err(ApiError::InvalidToken);
    }

    Ok(session)
}
