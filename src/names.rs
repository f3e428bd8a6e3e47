pub const API_PREFIX: &str = "/api/v1";

pub const REGISTER_URL: &str = "/auth/register/";
pub const TOKEN_URL: &str = "/auth/token/";
pub const TOKEN_REFRESH_URL: &str = "/auth/token/refresh/";
pub const MANAGE_ACCOUNT_URL: &str = "/auth/manage/";

pub const CREATE_EXAM_URL: &str = "/exams/create/";
pub const VIEW_EXAMS_URL: &str = "/exams/view/";
pub const MANAGE_EXAM_URL: &str = "/exams/manage/{id}/";

pub const CREATE_HOMEWORK_URL: &str = "/homeworks/create/";
pub const MANAGE_HOMEWORK_URL: &str = "/homeworks/manage/";

pub const CREATE_TIMETABLE_URL: &str = "/timetable/create/";
pub const MANAGE_TIMETABLE_URL: &str = "/timetable/manage/";

// Field limits
pub const MAX_EXAM_TITLE_LEN: usize = 200;
pub const MAX_SUBJECT_NAME_LEN: usize = 100;
pub const MAX_CHAPTER_TITLE_LEN: usize = 200;
pub const MAX_HOMEWORK_TITLE_LEN: usize = 200;
pub const MAX_TIMETABLE_NAME_LEN: usize = 200;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;

// Token lifetimes
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 5;
pub const DEFAULT_REFRESH_TOKEN_TTL_MINUTES: i64 = 24 * 60;
