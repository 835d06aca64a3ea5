//! Session lifecycle rules for the academy platform.
//!
//! - [`session_status`]: who may join a session and when, status display, and
//!   auto-completion of sessions that ran past their end
//! - [`attendance_status`]: a user's attendance, from live join records and session reports
//! - [`student_session`]: a student's sessions across all session kinds
//!
//! Items from `entity` are re-exported so consumers of the `domain` crate do not need to
//! depend on it directly.
pub use entity::{
    academies, roles::Role, session_kind::SessionKind, session_status::SessionStatus, users, Id,
};

pub mod attendance_status;
pub mod clock;
pub mod error;
pub mod join_window;
pub mod messages;
pub mod session;
pub mod session_status;
pub mod student_session;

pub mod gateway;

pub use attendance_status::{AttendanceStatusDto, AttendanceStatusResolver};
pub use clock::{AcademyContext, Clock, FixedClock, SystemClock};
pub use session::{Session, SessionRef, TimingDefaults};
pub use session_status::{SessionStatusService, StatusDisplay};
pub use student_session::{FeedbackOutcome, StudentSessionService};
