pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod response;
pub mod services;
pub mod utils;

use axum::Router;

use services::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: db::Db, ttl: services::auth::TokenTtl) -> Self {
        Self {
            auth: AuthService::new(db.clone(), ttl),
            db,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::auth::routes())
        .merge(handlers::exams::routes())
        .merge(handlers::homeworks::routes())
        .merge(handlers::timetable::routes());

    Router::new()
        .nest(names::API_PREFIX, api)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> response::ApiResponse {
    response::ApiResponse::not_found("Not found.")
}
