//! Request extractors that turn rejections into `Error`s so every failure has the same body.

use crate::auth::verify_token;
use crate::error::ErrorType;
use crate::server::AppState;
use crate::Error;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

/// A JSON body that rejects malformed or unexpected input with a 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub(crate) struct JsonBody<T>(pub T);

/// A query string that rejects malformed or unexpected parameters with a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub(crate) struct QueryParams<T>(pub T);

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::msg(ErrorType::Request, rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::msg(ErrorType::Request, rejection.body_text())
    }
}

/// The caller, as named by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub id: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::msg(ErrorType::Unauthorized, "Missing token"))?;

        let claims = verify_token(token, state.config.token_secret()).map_err(|e| {
            debug!("Rejected token: {e:#}");
            Error::msg(ErrorType::Unauthorized, "Invalid token")
        })?;
        Ok(AuthUser { id: claims.sub })
    }
}
