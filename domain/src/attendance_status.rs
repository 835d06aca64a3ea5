//! Attendance status of one user in one session.
//!
//! Combines the live join record kept while the meeting runs with the scored report
//! written after the session. Nothing here is persisted; the status is derived on read.

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::session::Session;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use entity::{
    attendance_status::AttendanceStatus, meeting_attendances, session_kind::SessionKind,
    session_status::SessionStatus, users, Id,
};
use entity_api::session_report::{self, SessionReport};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

/// An open join older than this, once the session has ended, is treated as a missed leave.
const STALE_JOIN_MINUTES: i64 = 5;
/// Live duration keeps counting this long after the nominal end.
const LIVE_DURATION_GRACE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NotStarted,
    NotJoinedYet,
    /// In the meeting right now (quran and interactive sessions)
    Present,
    Attended,
    Partial,
    Left,
    Absent,
    PartialAttendance,
    NotAttended,
    /// Joined, but the session has not been scored yet
    NotEnoughTime,
}

impl From<AttendanceStatus> for AttendanceState {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Attended => AttendanceState::Attended,
            AttendanceStatus::Partial => AttendanceState::Partial,
            AttendanceStatus::Left => AttendanceState::Left,
            AttendanceStatus::Absent => AttendanceState::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Scheduled,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStatusDto {
    pub is_currently_in_meeting: bool,
    pub attendance_status: AttendanceState,
    /// Always two decimals, e.g. `"87.50"`
    pub attendance_percentage: String,
    pub duration_minutes: i32,
    pub join_count: i32,
    pub session_state: SessionState,
    pub has_ever_joined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_until_start: Option<i64>,
    pub is_late: bool,
    pub late_minutes: i32,
    pub last_updated: Option<DateTime<Utc>>,
}

impl AttendanceStatusDto {
    fn not_started(minutes_until_start: i64) -> Self {
        Self {
            is_currently_in_meeting: false,
            attendance_status: AttendanceState::NotStarted,
            attendance_percentage: format_percentage(0.0),
            duration_minutes: 0,
            join_count: 0,
            session_state: SessionState::Scheduled,
            has_ever_joined: false,
            minutes_until_start: Some(minutes_until_start),
            is_late: false,
            late_minutes: 0,
            last_updated: None,
        }
    }
}

/// Real-time attendance of a user whose session is not over yet.
#[async_trait]
pub trait AttendanceProvider: Send + Sync {
    async fn current_status(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        user_id: Id,
        attendance: Option<&meeting_attendances::Model>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStatusDto, Error>;
}

/// Provider for academic sessions; a user in the meeting is `attended`.
#[derive(Debug, Clone, Copy)]
pub struct AcademicAttendanceProvider {
    pub default_duration: i64,
}

/// Provider for quran and interactive sessions; a user in the meeting is `present`.
#[derive(Debug, Clone, Copy)]
pub struct UnifiedAttendanceProvider {
    pub default_duration: i64,
}

#[async_trait]
impl AttendanceProvider for AcademicAttendanceProvider {
    async fn current_status(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        user_id: Id,
        attendance: Option<&meeting_attendances::Model>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStatusDto, Error> {
        let report = session_report::find_for_student(db, session.kind(), session.id(), user_id)
            .await?;
        Ok(live_status(
            session,
            attendance,
            report,
            now,
            self.default_duration,
            AttendanceState::Attended,
        ))
    }
}

#[async_trait]
impl AttendanceProvider for UnifiedAttendanceProvider {
    async fn current_status(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        user_id: Id,
        attendance: Option<&meeting_attendances::Model>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceStatusDto, Error> {
        let report = session_report::find_for_student(db, session.kind(), session.id(), user_id)
            .await?;
        Ok(live_status(
            session,
            attendance,
            report,
            now,
            self.default_duration,
            AttendanceState::Present,
        ))
    }
}

fn live_status(
    session: &Session,
    attendance: Option<&meeting_attendances::Model>,
    report: Option<SessionReport>,
    now: DateTime<Utc>,
    default_duration: i64,
    in_meeting: AttendanceState,
) -> AttendanceStatusDto {
    let planned = session.duration_minutes().map_or(default_duration, i64::from);
    let scheduled_at = session.scheduled_at();
    let join_count = attendance.map_or(0, |attendance| attendance.join_count);
    let has_ever_joined = attendance.is_some();

    if session.status() == SessionStatus::Completed {
        if let Some(report) = report {
            return AttendanceStatusDto {
                is_currently_in_meeting: false,
                attendance_status: report
                    .attendance_status
                    .map_or(AttendanceState::Absent, AttendanceState::from),
                attendance_percentage: format_percentage(
                    report.attendance_percentage.unwrap_or(0.0),
                ),
                duration_minutes: report.actual_attendance_minutes.unwrap_or(0),
                join_count,
                session_state: SessionState::Completed,
                has_ever_joined,
                minutes_until_start: None,
                is_late: report.is_late.unwrap_or(false),
                late_minutes: report.late_minutes.unwrap_or(0),
                last_updated: Some(report.updated_at.with_timezone(&Utc)),
            };
        }
    }

    let in_meeting_now = attendance.is_some_and(|attendance| {
        is_currently_in_meeting(attendance, scheduled_at, planned, now)
    });

    let attendance_status = if in_meeting_now {
        in_meeting
    } else {
        report
            .as_ref()
            .and_then(|report| report.attendance_status)
            .map_or(AttendanceState::Absent, AttendanceState::from)
    };

    let duration_minutes = match attendance {
        Some(attendance) if in_meeting_now => live_duration(attendance, scheduled_at, planned, now),
        Some(attendance) => attendance.total_duration_minutes,
        None => 0,
    };

    let last_updated = attendance
        .map(|attendance| attendance.updated_at)
        .or_else(|| report.as_ref().map(|report| report.updated_at))
        .map(|at| at.with_timezone(&Utc));

    AttendanceStatusDto {
        is_currently_in_meeting: in_meeting_now,
        attendance_status,
        attendance_percentage: format_percentage(
            report
                .as_ref()
                .and_then(|report| report.attendance_percentage)
                .unwrap_or(0.0),
        ),
        duration_minutes,
        join_count,
        session_state: SessionState::Scheduled,
        has_ever_joined,
        minutes_until_start: None,
        is_late: report
            .as_ref()
            .and_then(|report| report.is_late)
            .unwrap_or(false),
        late_minutes: report
            .as_ref()
            .and_then(|report| report.late_minutes)
            .unwrap_or(0),
        last_updated,
    }
}

/// A user is in the meeting while their last join has no later leave. An open join
/// left over from a session that already ended is ignored.
fn is_currently_in_meeting(
    attendance: &meeting_attendances::Model,
    scheduled_at: Option<DateTime<Utc>>,
    planned_minutes: i64,
    now: DateTime<Utc>,
) -> bool {
    let Some(joined_at) = attendance.last_join_time.map(|at| at.with_timezone(&Utc)) else {
        return false;
    };
    if attendance
        .last_leave_time
        .is_some_and(|left_at| left_at.with_timezone(&Utc) >= joined_at)
    {
        return false;
    }

    let stale = scheduled_at.is_some_and(|start| {
        now - joined_at > Duration::minutes(STALE_JOIN_MINUTES)
            && now > start + Duration::minutes(planned_minutes)
    });

    !stale
}

/// Recorded minutes plus the minutes of the current, still open, stay.
fn live_duration(
    attendance: &meeting_attendances::Model,
    scheduled_at: Option<DateTime<Utc>>,
    planned_minutes: i64,
    now: DateTime<Utc>,
) -> i32 {
    let total = attendance.total_duration_minutes;
    let (Some(start), Some(joined_at)) = (
        scheduled_at,
        attendance.last_join_time.map(|at| at.with_timezone(&Utc)),
    ) else {
        return total;
    };

    let counted_until =
        start + Duration::minutes(planned_minutes + LIVE_DURATION_GRACE_MINUTES);
    if now < start || now > counted_until {
        return total;
    }

    let effective_join = joined_at.max(start);
    let current = (now - effective_join).num_minutes().max(0);
    total.saturating_add(i32::try_from(current).unwrap_or(i32::MAX))
}

fn format_percentage(value: f64) -> String {
    format!("{value:.2}")
}

pub struct AttendanceStatusResolver {
    default_duration: i64,
    academic: Arc<dyn AttendanceProvider>,
    unified: Arc<dyn AttendanceProvider>,
    clock: Arc<dyn Clock>,
}

impl AttendanceStatusResolver {
    pub fn new(default_duration: i64) -> Self {
        Self {
            default_duration,
            academic: Arc::new(AcademicAttendanceProvider { default_duration }),
            unified: Arc::new(UnifiedAttendanceProvider { default_duration }),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_providers(
        mut self,
        academic: Arc<dyn AttendanceProvider>,
        unified: Arc<dyn AttendanceProvider>,
    ) -> Self {
        self.academic = academic;
        self.unified = unified;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn attendance_status(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        user: &users::Model,
        now: Option<DateTime<Utc>>,
    ) -> Result<AttendanceStatusDto, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());
        let attendance = entity_api::meeting_attendance::find_for_user(
            db,
            session.kind(),
            session.id(),
            user.id,
        )
        .await?;
        let has_ever_joined = attendance.is_some();

        let planned = session
            .duration_minutes()
            .map_or(self.default_duration, i64::from);
        let (before, during, after) = match session.scheduled_at() {
            Some(start) => {
                let end = start + Duration::minutes(planned);
                (now < start, now >= start && now < end, now >= end)
            }
            None => (false, false, false),
        };

        if session.status() == SessionStatus::Completed || after {
            return self
                .completed_status(db, session, user.id, attendance.as_ref())
                .await;
        }

        if before {
            let seconds = session
                .scheduled_at()
                .map_or(0, |start| (start - now).num_seconds());
            return Ok(AttendanceStatusDto::not_started(
                ((seconds + 59) / 60).max(0),
            ));
        }

        let provider = match session.kind() {
            SessionKind::Academic => &self.academic,
            SessionKind::Quran | SessionKind::Interactive => &self.unified,
        };
        let mut status = provider
            .current_status(db, session, user.id, attendance.as_ref(), now)
            .await?;

        status.session_state = if during {
            SessionState::Ongoing
        } else {
            SessionState::Scheduled
        };
        status.has_ever_joined = has_ever_joined;
        if !has_ever_joined && (session.status() == SessionStatus::Scheduled || during) {
            status.attendance_status = AttendanceState::NotJoinedYet;
        }

        Ok(status)
    }

    async fn completed_status(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        user_id: Id,
        attendance: Option<&meeting_attendances::Model>,
    ) -> Result<AttendanceStatusDto, Error> {
        let has_ever_joined = attendance.is_some();
        let join_count = attendance.map_or(0, |attendance| attendance.join_count);

        let report =
            session_report::find_for_student(db, session.kind(), session.id(), user_id).await?;

        let Some(report) = report else {
            debug!("No report yet for user {user_id} in {}", session.reference());
            return Ok(AttendanceStatusDto {
                is_currently_in_meeting: false,
                attendance_status: if has_ever_joined {
                    AttendanceState::NotEnoughTime
                } else {
                    AttendanceState::NotAttended
                },
                attendance_percentage: format_percentage(0.0),
                duration_minutes: attendance
                    .map_or(0, |attendance| attendance.total_duration_minutes),
                join_count,
                session_state: SessionState::Completed,
                has_ever_joined,
                minutes_until_start: None,
                is_late: false,
                late_minutes: 0,
                last_updated: attendance.map(|attendance| attendance.updated_at.with_timezone(&Utc)),
            });
        };

        let duration_minutes = report.actual_attendance_minutes.unwrap_or(0);
        let attendance_status = if !has_ever_joined {
            AttendanceState::NotAttended
        } else if duration_minutes > 0
            && matches!(
                report.attendance_status,
                Some(AttendanceStatus::Left | AttendanceStatus::Partial)
            )
        {
            AttendanceState::PartialAttendance
        } else {
            report
                .attendance_status
                .map_or(AttendanceState::Absent, AttendanceState::from)
        };

        Ok(AttendanceStatusDto {
            is_currently_in_meeting: false,
            attendance_status,
            attendance_percentage: format_percentage(report.attendance_percentage.unwrap_or(0.0)),
            duration_minutes,
            join_count,
            session_state: SessionState::Completed,
            has_ever_joined,
            minutes_until_start: None,
            is_late: report.is_late.unwrap_or(false),
            late_minutes: report.late_minutes.unwrap_or(0),
            last_updated: Some(report.updated_at.with_timezone(&Utc)),
        })
    }
}
