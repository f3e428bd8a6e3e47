pub mod auth;
pub mod exams;
pub mod progress;
