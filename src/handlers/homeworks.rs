use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::{
    extractors::{ApiJson, ApiQuery, AuthGuard},
    models::{CreateHomeworkInput, HomeworkIdInput, HomeworkQuery},
    names,
    rejections::{AppError, ResultExt},
    response::ApiResponse,
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::CREATE_HOMEWORK_URL, post(create_homework))
        .route(
            names::MANAGE_HOMEWORK_URL,
            get(list_homeworks)
                .put(complete_homework)
                .delete(delete_homework),
        )
}

/// `PUT` and `DELETE` carry `{"id": ..}`; an absent body counts as a missing id.
fn homework_id(body: &Bytes) -> Result<i64, AppError> {
    let input: HomeworkIdInput = if body.iter().all(u8::is_ascii_whitespace) {
        HomeworkIdInput::default()
    } else {
        serde_json::from_slice(body).map_err(|e| AppError::field("id", e.to_string()))?
    };

    input
        .id
        .ok_or_else(|| AppError::bad_request("Homework ID is required."))
}

async fn create_homework(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(mut body): ApiJson<CreateHomeworkInput>,
) -> Result<ApiResponse, AppError> {
    body.title = body.title.trim().to_string();
    if body.title.is_empty() {
        return Err(AppError::field("title", "This field may not be blank."));
    }
    if body.title.chars().count() > names::MAX_HOMEWORK_TITLE_LEN {
        return Err(AppError::field(
            "title",
            format!(
                "Ensure this field has no more than {} characters.",
                names::MAX_HOMEWORK_TITLE_LEN
            ),
        ));
    }

    let subject = body
        .subject_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(utils::capitalize);
    if subject
        .as_ref()
        .is_some_and(|s| s.chars().count() > names::MAX_SUBJECT_NAME_LEN)
    {
        return Err(AppError::field(
            "subject_name",
            format!(
                "Ensure this field has no more than {} characters.",
                names::MAX_SUBJECT_NAME_LEN
            ),
        ));
    }

    let homework = state
        .db
        .create_homework(user.id, &body, subject.as_deref())
        .await
        .reject("could not create homework")?;

    Ok(ApiResponse::created("Homework created successfully.").with_data(homework))
}

async fn list_homeworks(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HomeworkQuery>,
) -> Result<ApiResponse, AppError> {
    let homeworks = state
        .db
        .homeworks(user.id, &query)
        .await
        .reject("could not list homeworks")?;

    Ok(ApiResponse::ok("Homeworks fetched successfully.").with_data(homeworks))
}

async fn complete_homework(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, AppError> {
    let homework_id = homework_id(&body)?;

    let homework = state
        .db
        .complete_homework(homework_id, user.id)
        .await
        .reject("could not update homework")?
        .ok_or_else(|| AppError::not_found("Homework not found."))?;

    Ok(ApiResponse::ok("Homework marked as completed.").with_data(homework))
}

async fn delete_homework(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, AppError> {
    let homework_id = homework_id(&body)?;

    let deleted = state
        .db
        .delete_homework(homework_id, user.id)
        .await
        .reject("could not delete homework")?;
    if !deleted {
        return Err(AppError::not_found("Homework not found."));
    }

    Ok(ApiResponse::ok("Homework deleted successfully.").with_data(json!({ "id": homework_id })))
}
