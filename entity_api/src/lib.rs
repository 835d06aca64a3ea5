pub use entity::{
    academic_sessions, academies, interactive_course_sessions, interactive_courses,
    meeting_attendances, quran_sessions, session_kind::SessionKind,
    session_status::SessionStatus, users, Id,
};

pub mod academic_session;
pub mod academic_subscription;
pub mod academic_teacher_profile;
pub mod academy;
pub mod error;
pub mod interactive_course;
pub mod interactive_course_session;
pub mod meeting_attendance;
pub mod query;
pub mod quran_circle;
pub mod quran_session;
pub mod session_report;
pub mod user;

pub use query::{SessionFilters, SortOrder};
