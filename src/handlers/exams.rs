use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::Value;

use crate::{
    db::models::ExamModel,
    extractors::{ApiJson, ApiPath, AuthGuard},
    models::{ChapterStatusInput, CreateExamInput, UpdateExamInput},
    names,
    rejections::{AppError, FieldErrors, ResultExt},
    response::ApiResponse,
    services::{
        exams::{self, ExamPatch},
        progress,
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::CREATE_EXAM_URL, post(create_exam))
        .route(names::VIEW_EXAMS_URL, get(list_exams))
        .route(
            names::MANAGE_EXAM_URL,
            get(exam_detail).patch(patch_exam).delete(delete_exam),
        )
}

async fn owned_exam(state: &AppState, exam_id: i64, user_id: i64) -> Result<ExamModel, AppError> {
    state
        .db
        .exam_for_user(exam_id, user_id)
        .await
        .reject("could not load exam")?
        .ok_or_else(|| AppError::not_found("Not found."))
}

async fn detail_response(
    state: &AppState,
    exam_id: i64,
    response: ApiResponse,
) -> Result<ApiResponse, AppError> {
    let snapshot = state
        .db
        .exam_snapshot(exam_id)
        .await
        .reject("could not load exam")?;

    Ok(response.with_data(progress::detail(&snapshot)))
}

async fn create_exam(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateExamInput>,
) -> Result<ApiResponse, AppError> {
    let mut errors = FieldErrors::new();
    let title = exams::validate_title(body.title.as_deref(), true, &mut errors);
    let subjects = exams::ingest_subjects(&body.subjects, &mut errors);

    let Some(title) = title.filter(|_| errors.is_empty()) else {
        return Err(AppError::invalid(errors));
    };

    let exam_id = state
        .db
        .create_exam(user.id, &title, &subjects)
        .await
        .reject("could not create exam")?;

    detail_response(&state, exam_id, ApiResponse::created("Exam created successfully.")).await
}

async fn list_exams(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<ApiResponse, AppError> {
    let exams = state
        .db
        .exams(user.id)
        .await
        .reject("could not list exams")?;

    let items: Vec<progress::ExamListItem> = exams.iter().map(progress::list_item).collect();
    Ok(ApiResponse::ok("Exams retrieved successfully.").with_data(items))
}

async fn exam_detail(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiPath(exam_id): ApiPath<i64>,
) -> Result<ApiResponse, AppError> {
    let exam = owned_exam(&state, exam_id, user.id).await?;
    detail_response(&state, exam.id, ApiResponse::ok("Exam retrieved successfully.")).await
}

async fn patch_exam(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiPath(exam_id): ApiPath<i64>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse, AppError> {
    let exam = owned_exam(&state, exam_id, user.id).await?;

    match ExamPatch::classify(body)? {
        ExamPatch::Stats => {
            let snapshot = state
                .db
                .exam_snapshot(exam.id)
                .await
                .reject("could not load exam")?;
            Ok(ApiResponse::ok("Exam stats retrieved successfully.")
                .with_data(progress::stats(&snapshot)))
        }
        ExamPatch::SingleStatus(entry) => set_single_status(&state, &exam, entry).await,
        ExamPatch::BulkStatus(entries) => set_bulk_status(&state, &exam, &entries).await,
        ExamPatch::Structure(input) => merge_structure(&state, &exam, input).await,
    }
}

async fn set_single_status(
    state: &AppState,
    exam: &ExamModel,
    entry: ChapterStatusInput,
) -> Result<ApiResponse, AppError> {
    state
        .db
        .set_chapter_status(exam, entry.chapter_id, entry.is_completed)
        .await
        .reject("could not update chapter status")?
        .ok_or_else(|| AppError::not_found("Chapter not found in this exam."))?;

    detail_response(
        state,
        exam.id,
        ApiResponse::ok("Chapter status updated successfully."),
    )
    .await
}

async fn set_bulk_status(
    state: &AppState,
    exam: &ExamModel,
    entries: &[ChapterStatusInput],
) -> Result<ApiResponse, AppError> {
    let (updated, missing) = state
        .db
        .set_chapter_statuses(exam, entries)
        .await
        .reject("could not update chapter statuses")?;

    let outcome = exams::bulk_outcome(updated, &missing)?;

    let mut response = ApiResponse::ok(format!(
        "{} chapters updated successfully.",
        outcome.updated.len()
    ));
    if !outcome.errors.is_empty() {
        response = response.with_errors(&outcome.errors);
    }

    detail_response(state, exam.id, response).await
}

async fn merge_structure(
    state: &AppState,
    exam: &ExamModel,
    input: UpdateExamInput,
) -> Result<ApiResponse, AppError> {
    let mut errors = FieldErrors::new();
    let title = exams::validate_title(input.title.as_deref(), false, &mut errors);
    let subjects = exams::ingest_subjects(input.subjects.as_deref().unwrap_or_default(), &mut errors);

    if !errors.is_empty() {
        return Err(AppError::invalid(errors));
    }

    state
        .db
        .update_exam(exam, title.as_deref(), &subjects)
        .await
        .reject("could not update exam")?;

    detail_response(state, exam.id, ApiResponse::ok("Exam updated successfully.")).await
}

async fn delete_exam(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiPath(exam_id): ApiPath<i64>,
) -> Result<ApiResponse, AppError> {
    let exam = owned_exam(&state, exam_id, user.id).await?;

    let deleted = state
        .db
        .delete_exam(exam.id, user.id)
        .await
        .reject("could not delete exam")?;
    if !deleted {
        return Err(AppError::not_found("Not found."));
    }

    Ok(ApiResponse::ok(format!(
        "Exam \"{}\" deleted successfully.",
        exam.title
    )))
}
