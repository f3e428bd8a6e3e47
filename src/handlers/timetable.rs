use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::{
    db::{
        models::{PeriodRow, TimetableModel},
        PeriodSlot,
    },
    extractors::{ApiJson, AuthGuard},
    models::{CreateTimetableInput, DayInput, UpdateTimetableInput},
    names,
    rejections::{AppError, ResultExt},
    response::ApiResponse,
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(names::CREATE_TIMETABLE_URL, post(create_timetable))
        .route(
            names::MANAGE_TIMETABLE_URL,
            get(timetable).put(update_timetable).delete(delete_timetable),
        )
}

#[derive(Debug, Serialize)]
struct PeriodView {
    order: i64,
    subject: String,
}

#[derive(Debug, Serialize)]
struct DayView {
    id: i64,
    name: String,
    periods: Vec<PeriodView>,
}

#[derive(Debug, Serialize)]
struct TimetableView {
    id: i64,
    name: String,
    days: Vec<DayView>,
}

/// Group period rows (ordered by day, then order) under their day.
fn timetable_view(timetable: TimetableModel, rows: Vec<PeriodRow>) -> TimetableView {
    let mut days: Vec<DayView> = Vec::new();
    for row in rows {
        let period = PeriodView {
            order: row.order,
            subject: row.subject,
        };
        match days.last_mut() {
            Some(day) if day.id == row.day_id => day.periods.push(period),
            _ => days.push(DayView {
                id: row.day_id,
                name: row.day_name,
                periods: vec![period],
            }),
        }
    }

    TimetableView {
        id: timetable.id,
        name: timetable.name,
        days,
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::field("name", "This field may not be blank."));
    }
    if name.chars().count() > names::MAX_TIMETABLE_NAME_LEN {
        return Err(AppError::field(
            "name",
            format!(
                "Ensure this field has no more than {} characters.",
                names::MAX_TIMETABLE_NAME_LEN
            ),
        ));
    }
    Ok(name.to_string())
}

/// Flatten the nested days payload. Periods with a blank subject are dropped.
fn period_slots(days: &[DayInput]) -> Vec<PeriodSlot> {
    days.iter()
        .flat_map(|day| {
            day.periods.iter().filter_map(move |period| {
                let subject = period.subject.trim();
                (!subject.is_empty()).then(|| PeriodSlot {
                    day_id: day.id,
                    order: period.order,
                    subject: utils::title_case(subject),
                })
            })
        })
        .collect()
}

async fn check_days(state: &AppState, days: &[DayInput]) -> Result<(), AppError> {
    let day_ids: Vec<i64> = days.iter().map(|d| d.id).collect();
    let unknown = state
        .db
        .unknown_day(&day_ids)
        .await
        .reject("could not check days")?;

    match unknown {
        Some(day_id) => Err(AppError::bad_request(format!(
            "Day with id {day_id} does not exist"
        ))),
        None => Ok(()),
    }
}

async fn render(
    state: &AppState,
    timetable: TimetableModel,
    response: ApiResponse,
) -> Result<ApiResponse, AppError> {
    let rows = state
        .db
        .timetable_periods(timetable.id)
        .await
        .reject("could not load timetable")?;

    Ok(response.with_data(timetable_view(timetable, rows)))
}

async fn create_timetable(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTimetableInput>,
) -> Result<ApiResponse, AppError> {
    let name = validate_name(&body.name)?;
    check_days(&state, &body.days).await?;

    let timetable = state
        .db
        .create_timetable(user.id, &name, &period_slots(&body.days))
        .await
        .reject("could not create timetable")?;

    render(
        &state,
        timetable,
        ApiResponse::created("Timetable created successfully."),
    )
    .await
}

async fn first_timetable(state: &AppState, user_id: i64) -> Result<TimetableModel, AppError> {
    state
        .db
        .first_timetable(user_id)
        .await
        .reject("could not load timetable")?
        .ok_or_else(|| AppError::not_found("Timetable not found."))
}

async fn timetable(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<ApiResponse, AppError> {
    let timetable = first_timetable(&state, user.id).await?;
    render(
        &state,
        timetable,
        ApiResponse::ok("Timetable retrieved successfully."),
    )
    .await
}

async fn update_timetable(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateTimetableInput>,
) -> Result<ApiResponse, AppError> {
    let current = first_timetable(&state, user.id).await?;

    let name = body.name.as_deref().map(validate_name).transpose()?;
    let days = body.days.unwrap_or_default();
    check_days(&state, &days).await?;

    let timetable = state
        .db
        .update_timetable(current.id, user.id, name.as_deref(), &period_slots(&days))
        .await
        .reject("could not update timetable")?
        .ok_or_else(|| AppError::not_found("Timetable not found."))?;

    render(
        &state,
        timetable,
        ApiResponse::ok("Timetable updated successfully."),
    )
    .await
}

async fn delete_timetable(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let current = first_timetable(&state, user.id).await?;

    let deleted = state
        .db
        .delete_timetable(current.id, user.id)
        .await
        .reject("could not delete timetable")?;
    if !deleted {
        return Err(AppError::not_found("Timetable not found."));
    }

    Ok(StatusCode::NO_CONTENT)
}
