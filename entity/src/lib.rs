// Academy and people
pub mod academies;
pub mod roles;
pub mod users;

// Session kinds
pub mod academic_sessions;
pub mod academic_subscriptions;
pub mod academic_teacher_profiles;
pub mod course_enrollments;
pub mod interactive_course_sessions;
pub mod interactive_courses;
pub mod quran_circles;
pub mod quran_individual_circles;
pub mod quran_session_type;
pub mod quran_sessions;
pub mod session_kind;
pub mod session_status;

// Attendance
pub mod academic_session_reports;
pub mod attendance_status;
pub mod interactive_session_reports;
pub mod meeting_attendances;
pub mod student_session_reports;

/// A type alias that represents any Entity's internal id field data type.
/// Ids are only unique within a single session kind, so they always travel
/// together with a `session_kind::SessionKind` when referring to a session.
pub type Id = i64;
