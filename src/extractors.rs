use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{db::models::AuthUser, rejections::AppError, AppState};

/// JSON body extractor whose rejections use the response envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!("rejected request body: {e}");
            AppError::Validation {
                message: "Validation error.".to_string(),
                errors: json!({ "detail": [e.body_text()] }),
            }
        })?;
        Ok(ApiJson(value))
    }
}

/// Query-string extractor whose rejections use the response envelope.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation {
                message: "Validation error.".to_string(),
                errors: json!({ "detail": [e.body_text()] }),
            })?;
        Ok(ApiQuery(value))
    }
}

/// Path extractor; an id that does not parse names no resource, so it is a 404.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!("rejected path parameters: {e}");
                AppError::not_found("Not found.")
            })?;
        Ok(ApiPath(value))
    }
}

/// Guard extractor that resolves the `Authorization: Bearer <access>` token
/// against the database. Carries the authenticated user for handlers.
pub struct AuthGuard(pub AuthUser);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized(
                "Authentication credentials were not provided.",
            ))?;

        match state.db.get_user_by_access_token(token).await {
            Ok(Some(user)) => Ok(AuthGuard(user)),
            Ok(None) => Err(AppError::Unauthorized(
                "Given token not valid for any token type.",
            )),
            Err(e) => {
                tracing::error!("failed to resolve access token: {e:?}");
                Err(AppError::Internal("failed to resolve access token"))
            }
        }
    }
}

/// Extract the token from an `Authorization` header value of the form
/// `Bearer <token>` (scheme matched case-insensitively).
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
