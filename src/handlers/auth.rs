use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    db::models::AuthUser,
    extractors::{ApiJson, AuthGuard},
    models::{AccountUpdateInput, RegisterInput},
    names,
    rejections::{AppError, ResultExt},
    response::ApiResponse,
    services::auth::{LoginOutcome, RefreshOutcome, RegisterOutcome, UpdateAccountOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::REGISTER_URL, post(register))
        .route(names::TOKEN_URL, post(obtain_token))
        .route(names::TOKEN_REFRESH_URL, post(refresh_token))
        .route(
            names::MANAGE_ACCOUNT_URL,
            get(account).put(update_account).delete(delete_account),
        )
}

#[derive(Serialize)]
struct AccountView {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<AuthUser> for AccountView {
    fn from(user: AuthUser) -> Self {
        Self {
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterInput>,
) -> Result<ApiResponse, AppError> {
    let outcome = state
        .auth
        .register(&body)
        .await
        .reject("could not register user")?;

    match outcome {
        RegisterOutcome::Created(tokens) => {
            Ok(ApiResponse::created("User registered successfully.").with_data(tokens))
        }
        RegisterOutcome::Invalid(errors) => Err(AppError::invalid(errors)),
    }
}

#[derive(Deserialize)]
struct TokenPost {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenPost>,
) -> Result<ApiResponse, AppError> {
    let outcome = state
        .auth
        .login(&body.username, &body.password)
        .await
        .reject("could not log in")?;

    match outcome {
        LoginOutcome::Success(tokens) => {
            Ok(ApiResponse::ok("Token obtained successfully.").with_data(tokens))
        }
        LoginOutcome::InvalidCredentials => Err(AppError::Unauthorized(
            "No active account found with the given credentials",
        )),
    }
}

#[derive(Deserialize)]
struct RefreshPost {
    #[serde(default)]
    refresh: String,
}

async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshPost>,
) -> Result<ApiResponse, AppError> {
    let outcome = state
        .auth
        .refresh(&body.refresh)
        .await
        .reject("could not refresh token")?;

    match outcome {
        RefreshOutcome::Success(access) => Ok(ApiResponse::ok("Token refreshed successfully.")
            .with_data(json!({ "access": access }))),
        RefreshOutcome::InvalidToken => Err(AppError::Unauthorized("Token is invalid or expired")),
    }
}

async fn account(AuthGuard(user): AuthGuard) -> ApiResponse {
    ApiResponse::ok("Account retrieved successfully.").with_data(AccountView::from(user))
}

async fn update_account(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AccountUpdateInput>,
) -> Result<ApiResponse, AppError> {
    let outcome = state
        .auth
        .update_account(user.id, &body)
        .await
        .reject("could not update account")?;

    match outcome {
        UpdateAccountOutcome::Updated(user) => {
            Ok(ApiResponse::ok("Account updated successfully.").with_data(AccountView::from(user)))
        }
        UpdateAccountOutcome::Invalid(errors) => Err(AppError::invalid(errors)),
    }
}

async fn delete_account(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .deactivate(user.id)
        .await
        .reject("could not deactivate account")?;

    Ok(StatusCode::NO_CONTENT)
}
