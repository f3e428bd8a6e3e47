pub mod auth;
pub mod exams;
pub mod homeworks;
pub mod timetable;
