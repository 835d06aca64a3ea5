//! Join eligibility, status display and auto-completion of overdue sessions.
//!
//! Auto-completion runs in two phases. [`SessionStatusService::complete_if_expired`]
//! moves the session to `completed` inside a transaction holding a row lock, so
//! concurrent callers complete it at most once. Only after the commit does
//! [`SessionStatusService::auto_complete_if_expired`] close the meeting room and publish
//! `SessionCompleted`; a room that fails to close is logged and never undoes the completion.

use crate::clock::{offset_minutes, Clock, SystemClock};
use crate::error::Error;
use crate::gateway::livekit::MeetingService;
use crate::join_window::{Audience, JoinPolicy, JoinWindow};
use crate::messages::{
    ArabicCatalog, ArabicTimeRemaining, DisplayKey, MessageCatalog, TimeRemainingFormatter,
};
use crate::session::{Session, SessionRef, SessionTiming, TimingDefaults};
use chrono::{DateTime, Utc};
use entity::{roles::Role, session_kind::SessionKind, session_status::SessionStatus, users, Id};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use std::sync::Arc;

/// Kinds probed, in order, when a session is resolved without its kind.
/// Interactive wins when the same id exists in several tables.
const PROBE_ORDER: [SessionKind; 3] = [
    SessionKind::Interactive,
    SessionKind::Academic,
    SessionKind::Quran,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub preparation_minutes: i64,
    pub ending_buffer_minutes: i64,
    pub meeting_room_name: Option<String>,
    /// Only set for ready and ongoing sessions
    pub session_end_time: Option<DateTime<Utc>>,
    pub has_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDisplay {
    pub status: SessionStatus,
    pub can_join: bool,
    pub message: String,
    pub button_text: String,
    pub button_class: String,
    pub session_info: SessionInfo,
}

/// Result of the transactional half of auto-completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The session was completed by this call; holds the stored row.
    Completed(Box<Session>),
    /// Not live or not past its end and buffer.
    NotDue,
    /// The row no longer exists.
    Vanished,
    /// Another caller changed the status before the lock was taken.
    ChangedConcurrently,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub completed: usize,
    pub failed: Vec<SessionRef>,
}

impl SweepReport {
    fn load_failed(&mut self, reference: SessionRef, e: Error) {
        error!("Failed to load {reference} for auto-completion: {e}");
        self.examined += 1;
        self.failed.push(reference);
    }
}

pub struct SessionStatusService {
    defaults: TimingDefaults,
    meetings: Arc<dyn MeetingService>,
    events: EventPublisher,
    catalog: Arc<dyn MessageCatalog>,
    formatter: Arc<dyn TimeRemainingFormatter>,
    clock: Arc<dyn Clock>,
}

impl SessionStatusService {
    pub fn new(defaults: TimingDefaults, meetings: Arc<dyn MeetingService>) -> Self {
        Self {
            defaults,
            meetings,
            events: EventPublisher::new(),
            catalog: Arc::new(ArabicCatalog),
            formatter: Arc::new(ArabicTimeRemaining),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_time_formatter(mut self, formatter: Arc<dyn TimeRemainingFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn defaults(&self) -> &TimingDefaults {
        &self.defaults
    }

    pub fn session_configuration(&self, session: &Session) -> SessionTiming {
        session.timing(&self.defaults)
    }

    /// Whether `role` may enter the session's meeting at `now`.
    ///
    /// Nothing is joinable once the session is past its end and buffer. Before that,
    /// ready and ongoing sessions are always open; scheduled and absent sessions open
    /// at the start for students and at the start of preparation for teachers.
    pub fn can_user_join_session(
        &self,
        session: &Session,
        role: Role,
        now: Option<DateTime<Utc>>,
    ) -> bool {
        let now = now.unwrap_or_else(|| self.clock.now());
        let Some(scheduled_at) = session.scheduled_at() else {
            return false;
        };

        let policy = JoinPolicy::Eligibility {
            audience: Audience::from(role),
            timing: self.session_configuration(session),
            default_duration: self.defaults.duration_minutes,
        };
        let window = JoinWindow::compute(scheduled_at, session.duration_minutes(), &policy);

        if window.has_closed(now) {
            return false;
        }

        match session.status() {
            SessionStatus::Ready | SessionStatus::Ongoing => true,
            SessionStatus::Absent | SessionStatus::Scheduled => window.contains(now),
            _ => false,
        }
    }

    /// Whether `now` is at or past the start plus duration plus buffer.
    /// Sessions without a start time never expire.
    pub fn has_expired(
        &self,
        session: &Session,
        buffer_override: Option<i64>,
        now: Option<DateTime<Utc>>,
    ) -> bool {
        let now = now.unwrap_or_else(|| self.clock.now());
        self.expires_at(session, buffer_override)
            .is_some_and(|expires_at| now >= expires_at)
    }

    fn duration_minutes(&self, session: &Session) -> i64 {
        session
            .duration_minutes()
            .map_or(self.defaults.duration_minutes, i64::from)
    }

    fn expires_at(&self, session: &Session, buffer_override: Option<i64>) -> Option<DateTime<Utc>> {
        let buffer =
            buffer_override.unwrap_or_else(|| self.session_configuration(session).buffer_minutes);
        session
            .scheduled_at()
            .map(|at| offset_minutes(at, self.duration_minutes(session).saturating_add(buffer)))
    }

    /// Message, button and join flag shown to `role` for the session's current status.
    /// `preparation_override` only changes the countdown of scheduled sessions.
    pub fn status_display(
        &self,
        session: &Session,
        role: Role,
        preparation_override: Option<i64>,
        now: Option<DateTime<Utc>>,
    ) -> StatusDisplay {
        let now = now.unwrap_or_else(|| self.clock.now());
        let timing = self.session_configuration(session);
        let preparation_minutes = preparation_override.unwrap_or(timing.preparation_minutes);
        let can_join = self.can_user_join_session(session, role, Some(now));
        let status = session.status();

        let mut countdown = None;
        let key = match status {
            SessionStatus::Ready => DisplayKey::Ready,
            SessionStatus::Ongoing => DisplayKey::Ongoing,
            SessionStatus::Scheduled if can_join => DisplayKey::ScheduledJoinable,
            SessionStatus::Scheduled => match session.scheduled_at() {
                None => DisplayKey::ScheduledWithoutTime,
                Some(scheduled_at) => {
                    let opens_at =
                        offset_minutes(scheduled_at, preparation_minutes.saturating_neg());
                    let remaining = self.formatter.format(opens_at, now);
                    if remaining.is_past {
                        DisplayKey::ScheduledPreparing
                    } else {
                        countdown = Some(remaining.formatted);
                        DisplayKey::ScheduledOpensIn
                    }
                }
            },
            SessionStatus::Absent => match (Audience::from(role), can_join) {
                (Audience::Teacher, true) => DisplayKey::AbsentTeacherJoinable,
                (Audience::Student, true) => DisplayKey::AbsentStudentJoinable,
                (Audience::Teacher, false) => DisplayKey::AbsentTeacherClosed,
                (Audience::Student, false) => DisplayKey::AbsentStudentRecorded,
            },
            SessionStatus::Completed => DisplayKey::Completed,
            SessionStatus::Cancelled => DisplayKey::Cancelled,
            SessionStatus::Unscheduled => DisplayKey::Unscheduled,
        };

        let session_end_time = if status.is_live() {
            self.expires_at(session, None)
        } else {
            None
        };

        StatusDisplay {
            status,
            can_join,
            message: self.catalog.message(key, countdown.as_deref()),
            button_text: self.catalog.button_text(key),
            button_class: key.button_style().css_class().to_string(),
            session_info: SessionInfo {
                scheduled_at: session.scheduled_at(),
                duration_minutes: session.duration_minutes(),
                preparation_minutes,
                ending_buffer_minutes: timing.buffer_minutes,
                meeting_room_name: session.meeting_room_name().map(str::to_string),
                session_end_time,
                has_expired: session_end_time.is_some_and(|end| now >= end),
            },
        }
    }

    /// Completes an overdue ready or ongoing session under a row lock.
    ///
    /// The status is checked again once the lock is held; if another caller got there
    /// first nothing is written. `ended_at` is the scheduled end plus buffer and the
    /// actual duration is the planned one.
    pub async fn complete_if_expired(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        buffer_override: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, Error> {
        if !session.status().is_live() {
            return Ok(CompletionOutcome::NotDue);
        }
        let Some(ended_at) = self
            .expires_at(session, buffer_override)
            .filter(|expires_at| now >= *expires_at)
        else {
            return Ok(CompletionOutcome::NotDue);
        };
        let actual_duration = i32::try_from(self.duration_minutes(session)).unwrap_or(i32::MAX);

        let txn = db.begin().await?;
        let outcome = lock_and_complete(&txn, session, ended_at, actual_duration).await?;

        match outcome {
            CompletionOutcome::Completed(_) => txn.commit().await?,
            _ => txn.rollback().await?,
        }

        Ok(outcome)
    }

    /// Completes the session if it is overdue, then closes its meeting room and
    /// publishes `SessionCompleted`. Returns whether this call completed the session.
    pub async fn auto_complete_if_expired(
        &self,
        db: &DatabaseConnection,
        session: &Session,
        buffer_override: Option<i64>,
        now: Option<DateTime<Utc>>,
    ) -> Result<bool, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());

        let completed = match self
            .complete_if_expired(db, session, buffer_override, now)
            .await?
        {
            CompletionOutcome::Completed(completed) => completed,
            CompletionOutcome::NotDue => return Ok(false),
            CompletionOutcome::Vanished => {
                debug!("{} disappeared before it could be completed", session.reference());
                return Ok(false);
            }
            CompletionOutcome::ChangedConcurrently => {
                debug!("{} was already moved on by another request", session.reference());
                return Ok(false);
            }
        };

        info!("Auto-completed {}", completed.reference());

        if let Some(room_name) = completed.meeting_room_name() {
            if let Err(e) = self.meetings.end_meeting(room_name).await {
                warn!(
                    "Failed to close meeting room {room_name} of {}: {e}",
                    completed.reference()
                );
            }
        }

        self.events
            .publish(DomainEvent::SessionCompleted {
                session_type: completed.kind().to_string(),
                session_id: completed.id(),
                session: completed.to_json(),
            })
            .await;

        Ok(true)
    }

    /// Finds a session visible to `user`. Lookups are always limited to the user's
    /// academy. Without `kind` the tables are probed in [`PROBE_ORDER`].
    pub async fn resolve_session(
        &self,
        db: &impl ConnectionTrait,
        session_id: Id,
        user: &users::Model,
        kind: Option<SessionKind>,
    ) -> Result<Option<Session>, Error> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => PROBE_ORDER.to_vec(),
        };

        for kind in kinds {
            if let Some(session) =
                Session::find_in_academy(db, kind, session_id, user.academy_id).await?
            {
                return Ok(Some(session));
            }
        }

        debug!("No session {session_id} in academy {:?}", user.academy_id);
        Ok(None)
    }

    /// Runs auto-completion over every ready or ongoing session that started at or
    /// before `now`. A failing session is recorded and the sweep continues.
    pub async fn sweep_expired_sessions(
        &self,
        db: &DatabaseConnection,
        now: Option<DateTime<Utc>>,
    ) -> Result<SweepReport, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());

        let mut report = SweepReport::default();
        let mut candidates = Vec::new();

        for session in entity_api::quran_session::find_live_scheduled_before(db, now).await? {
            let reference = SessionRef {
                kind: SessionKind::Quran,
                id: session.id,
            };
            match Session::quran(db, session).await {
                Ok(session) => candidates.push(session),
                Err(e) => report.load_failed(reference, e),
            }
        }
        for session in entity_api::academic_session::find_live_scheduled_before(db, now).await? {
            candidates.push(Session::Academic { session });
        }
        for session in
            entity_api::interactive_course_session::find_live_scheduled_before(db, now).await?
        {
            let reference = SessionRef {
                kind: SessionKind::Interactive,
                id: session.id,
            };
            match Session::interactive(db, session).await {
                Ok(session) => candidates.push(session),
                Err(e) => report.load_failed(reference, e),
            }
        }

        for session in candidates {
            report.examined += 1;
            match self
                .auto_complete_if_expired(db, &session, None, Some(now))
                .await
            {
                Ok(true) => report.completed += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to auto-complete {}: {e}", session.reference());
                    report.failed.push(session.reference());
                }
            }
        }

        info!(
            "Session sweep examined {} sessions, completed {}, failed {}",
            report.examined,
            report.completed,
            report.failed.len()
        );

        Ok(report)
    }
}

async fn lock_and_complete(
    txn: &DatabaseTransaction,
    session: &Session,
    ended_at: DateTime<Utc>,
    actual_duration: i32,
) -> Result<CompletionOutcome, Error> {
    let id = session.id();

    let completed = match session {
        Session::Quran { circle, .. } => {
            match entity_api::quran_session::find_by_id_for_update(txn, id).await? {
                None => return Ok(CompletionOutcome::Vanished),
                Some(locked) if !locked.status.is_live() => {
                    return Ok(CompletionOutcome::ChangedConcurrently)
                }
                Some(locked) => Session::Quran {
                    session: entity_api::quran_session::complete(
                        txn,
                        locked,
                        ended_at,
                        actual_duration,
                    )
                    .await?,
                    circle: *circle,
                },
            }
        }
        Session::Academic { .. } => {
            match entity_api::academic_session::find_by_id_for_update(txn, id).await? {
                None => return Ok(CompletionOutcome::Vanished),
                Some(locked) if !locked.status.is_live() => {
                    return Ok(CompletionOutcome::ChangedConcurrently)
                }
                Some(locked) => Session::Academic {
                    session: entity_api::academic_session::complete(
                        txn,
                        locked,
                        ended_at,
                        actual_duration,
                    )
                    .await?,
                },
            }
        }
        Session::Interactive { course, .. } => {
            match entity_api::interactive_course_session::find_by_id_for_update(txn, id).await? {
                None => return Ok(CompletionOutcome::Vanished),
                Some(locked) if !locked.status.is_live() => {
                    return Ok(CompletionOutcome::ChangedConcurrently)
                }
                Some(locked) => Session::Interactive {
                    session: entity_api::interactive_course_session::complete(
                        txn,
                        locked,
                        ended_at,
                        actual_duration,
                    )
                    .await?,
                    course: course.clone(),
                },
            }
        }
    };

    Ok(CompletionOutcome::Completed(Box::new(completed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::livekit::MockMeetingService;
    use crate::session::test_support::*;
    use crate::session::CircleTiming;

    fn service() -> SessionStatusService {
        SessionStatusService::new(TimingDefaults::default(), Arc::new(MockMeetingService::new()))
    }

    fn scheduled(status: SessionStatus) -> Session {
        academic(status)
    }

    #[test]
    fn nothing_is_joinable_after_end_and_buffer() {
        let service = service();
        for status in [SessionStatus::Ready, SessionStatus::Ongoing, SessionStatus::Scheduled] {
            for role in [Role::Student, Role::QuranTeacher, Role::Admin] {
                assert!(!service.can_user_join_session(&scheduled(status), role, Some(at(11, 5))));
            }
        }
    }

    #[test]
    fn live_sessions_are_joinable_until_expiry() {
        let service = service();
        let session = scheduled(SessionStatus::Ready);

        assert!(service.can_user_join_session(&session, Role::Student, Some(at(9, 0))));
        assert!(service.can_user_join_session(&session, Role::Student, Some(at(11, 4))));
    }

    #[test]
    fn teachers_join_scheduled_sessions_during_preparation() {
        let service = service();
        let session = scheduled(SessionStatus::Scheduled);

        assert!(service.can_user_join_session(&session, Role::AcademicTeacher, Some(at(9, 46))));
        assert!(!service.can_user_join_session(&session, Role::AcademicTeacher, Some(at(9, 44))));
    }

    #[test]
    fn students_join_scheduled_sessions_from_the_start() {
        let service = service();
        let session = scheduled(SessionStatus::Scheduled);

        assert!(!service.can_user_join_session(&session, Role::Student, Some(at(9, 59))));
        assert!(service.can_user_join_session(&session, Role::Student, Some(at(10, 0))));
        assert!(service.can_user_join_session(&session, Role::Student, Some(at(10, 5))));
        assert!(!service.can_user_join_session(&session, Role::Student, Some(at(11, 6))));
    }

    #[test]
    fn terminal_and_unscheduled_sessions_are_never_joinable() {
        let service = service();
        for status in [
            SessionStatus::Completed,
            SessionStatus::Cancelled,
            SessionStatus::Unscheduled,
        ] {
            assert!(!service.can_user_join_session(&scheduled(status), Role::Student, Some(at(10, 5))));
        }
    }

    #[test]
    fn sessions_without_a_start_are_neither_joinable_nor_expired() {
        let service = service();
        let mut model = academic_model(1, SessionStatus::Ready);
        model.scheduled_at = None;
        let session = Session::Academic { session: model };

        assert!(!service.can_user_join_session(&session, Role::Student, Some(at(10, 5))));
        assert!(!service.has_expired(&session, None, Some(at(23, 0))));
    }

    #[test]
    fn circle_buffer_moves_the_expiry() {
        let service = service();
        let session = Session::Quran {
            session: quran_model(1, SessionStatus::Ongoing),
            circle: Some(CircleTiming {
                preparation_minutes: None,
                ending_buffer_minutes: Some(20),
            }),
        };

        assert!(!service.has_expired(&session, None, Some(at(11, 19))));
        assert!(service.has_expired(&session, None, Some(at(11, 20))));
        assert!(service.has_expired(&session, Some(0), Some(at(11, 0))));
    }

    #[test]
    fn scheduled_display_counts_down_to_preparation() {
        let display = service().status_display(
            &scheduled(SessionStatus::Scheduled),
            Role::Student,
            None,
            Some(at(9, 0)),
        );

        assert!(!display.can_join);
        assert_eq!(display.message, "سيتم تحضير الاجتماع خلال 45 دقيقة");
        assert_eq!(display.button_text, "في انتظار تحضير الاجتماع");
        assert_eq!(display.button_class, "bg-gray-400 cursor-not-allowed");
        assert_eq!(display.session_info.preparation_minutes, 15);
        assert_eq!(display.session_info.session_end_time, None);
    }

    #[test]
    fn scheduled_display_uses_the_preparation_override() {
        let display = service().status_display(
            &scheduled(SessionStatus::Scheduled),
            Role::Student,
            Some(30),
            Some(at(9, 0)),
        );

        assert_eq!(display.message, "سيتم تحضير الاجتماع خلال 30 دقيقة");
        assert_eq!(display.session_info.preparation_minutes, 30);
    }

    #[test]
    fn scheduled_display_once_preparation_started() {
        let display = service().status_display(
            &scheduled(SessionStatus::Scheduled),
            Role::Student,
            None,
            Some(at(9, 50)),
        );

        assert!(!display.can_join);
        assert_eq!(display.message, "جاري تحضير الاجتماع...");
    }

    #[test]
    fn scheduled_display_for_a_teacher_in_preparation() {
        let display = service().status_display(
            &scheduled(SessionStatus::Scheduled),
            Role::QuranTeacher,
            None,
            Some(at(9, 50)),
        );

        assert!(display.can_join);
        assert_eq!(display.button_text, "انضم للجلسة");
        assert_eq!(display.button_class, "bg-blue-600 hover:bg-blue-700");
    }

    #[test]
    fn absent_display_depends_on_role() {
        let service = service();
        let session = scheduled(SessionStatus::Absent);

        let student = service.status_display(&session, Role::Student, None, Some(at(10, 10)));
        assert!(student.can_join);
        assert_eq!(student.button_text, "انضم للجلسة (غائب)");

        let late_student = service.status_display(&session, Role::Student, None, Some(at(12, 0)));
        assert_eq!(late_student.message, "تم تسجيل غياب الطالب");
        assert_eq!(late_student.button_class, "bg-red-400 cursor-not-allowed");

        let late_teacher =
            service.status_display(&session, Role::QuranTeacher, None, Some(at(12, 0)));
        assert_eq!(late_teacher.message, "انتهت فترة الجلسة");
    }

    #[test]
    fn ongoing_display_reports_end_time_and_expiry() {
        let service = service();
        let session = scheduled(SessionStatus::Ongoing);

        let running = service.status_display(&session, Role::Student, None, Some(at(10, 30)));
        assert!(running.can_join);
        assert_eq!(running.button_class, "bg-orange-600 hover:bg-orange-700 animate-pulse");
        assert_eq!(running.session_info.session_end_time, Some(at(11, 5)));
        assert!(!running.session_info.has_expired);

        let overdue = service.status_display(&session, Role::Student, None, Some(at(11, 30)));
        assert!(!overdue.can_join);
        assert!(overdue.session_info.has_expired);
    }

    #[test]
    fn cancelled_display() {
        let display =
            service().status_display(&scheduled(SessionStatus::Cancelled), Role::Student, None, Some(at(10, 0)));

        assert!(!display.can_join);
        assert_eq!(display.message, "تم إلغاء الجلسة");
        assert_eq!(display.button_text, "الجلسة ملغية");
    }

    #[test]
    fn out_of_range_overrides_saturate_instead_of_panicking() {
        let service = service();
        let session = scheduled(SessionStatus::Scheduled);

        let display = service.status_display(&session, Role::Student, Some(i64::MAX), Some(at(9, 0)));
        assert_eq!(display.message, "جاري تحضير الاجتماع...");

        assert!(!service.has_expired(&session, Some(i64::MAX), Some(at(12, 0))));
        assert!(service.has_expired(&session, Some(i64::MIN), Some(at(9, 0))));
    }

    #[cfg(feature = "mock")]
    mod database {
        use super::*;
        use entity::{academic_sessions, interactive_course_sessions, quran_individual_circles};
        use events::EventHandler;
        use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder {
            completed: Mutex<Vec<(String, Id)>>,
        }

        #[async_trait::async_trait]
        impl EventHandler for Recorder {
            async fn handle(&self, event: &DomainEvent) {
                let DomainEvent::SessionCompleted {
                    session_type,
                    session_id,
                    ..
                } = event;
                self.completed
                    .lock()
                    .unwrap()
                    .push((session_type.clone(), *session_id));
            }
        }

        fn completed_row(model: &academic_sessions::Model) -> academic_sessions::Model {
            academic_sessions::Model {
                status: SessionStatus::Completed,
                ended_at: Some(at(11, 5).into()),
                actual_duration_minutes: Some(60),
                ..model.clone()
            }
        }

        fn user() -> users::Model {
            users::Model {
                id: 42,
                academy_id: Some(3),
                name: "Student".to_string(),
                email: "student@example.com".to_string(),
                avatar: None,
                role: Role::Student,
                created_at: at(8, 0).into(),
                updated_at: at(8, 0).into(),
            }
        }

        #[tokio::test]
        async fn overdue_session_is_completed_once_and_its_room_closed() -> Result<(), Error> {
            let live = academic_model(1, SessionStatus::Ongoing);
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![live.clone()]])
                .append_query_results([vec![completed_row(&live)]])
                .into_connection();

            let mut meetings = MockMeetingService::new();
            meetings
                .expect_end_meeting()
                .withf(|room| room == "academic-room")
                .times(1)
                .returning(|_| Ok(()));
            let recorder = Arc::new(Recorder::default());
            let service = SessionStatusService::new(TimingDefaults::default(), Arc::new(meetings))
                .with_events(EventPublisher::new().with_handler(recorder.clone()));

            let session = Session::Academic { session: live };
            assert!(
                service
                    .auto_complete_if_expired(&db, &session, None, Some(at(11, 5)))
                    .await?
            );

            assert_eq!(
                *recorder.completed.lock().unwrap(),
                vec![("academic".to_string(), 1)]
            );

            let sql = logged_sql(db);
            assert!(sql.iter().any(|stmt| stmt.contains("FOR UPDATE")));
            assert!(sql.iter().any(|stmt| stmt.starts_with("UPDATE")));
            assert!(sql.iter().any(|stmt| stmt == "COMMIT"));

            Ok(())
        }

        #[tokio::test]
        async fn session_completed_by_another_request_is_left_alone() -> Result<(), Error> {
            let live = academic_model(1, SessionStatus::Ongoing);
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![completed_row(&live)]])
                .into_connection();

            let mut meetings = MockMeetingService::new();
            meetings.expect_end_meeting().times(0);
            let service = SessionStatusService::new(TimingDefaults::default(), Arc::new(meetings));

            let session = Session::Academic { session: live };
            assert!(
                !service
                    .auto_complete_if_expired(&db, &session, None, Some(at(11, 30)))
                    .await?
            );

            let sql = logged_sql(db);
            assert!(!sql.iter().any(|stmt| stmt.starts_with("UPDATE")));
            assert!(sql.iter().any(|stmt| stmt == "ROLLBACK"));

            Ok(())
        }

        #[tokio::test]
        async fn vanished_session_is_not_completed() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<academic_sessions::Model>::new()])
                .into_connection();

            let outcome = service()
                .complete_if_expired(&db, &academic(SessionStatus::Ready), None, at(12, 0))
                .await?;

            assert_eq!(outcome, CompletionOutcome::Vanished);
            Ok(())
        }

        #[tokio::test]
        async fn sessions_that_are_not_due_cause_no_writes() -> Result<(), Error> {
            let service = service();

            for (status, now) in [
                (SessionStatus::Ongoing, at(11, 4)),
                (SessionStatus::Completed, at(12, 0)),
                (SessionStatus::Cancelled, at(12, 0)),
                (SessionStatus::Scheduled, at(12, 0)),
            ] {
                let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
                assert!(
                    !service
                        .auto_complete_if_expired(&db, &academic(status), None, Some(now))
                        .await?
                );
                assert!(logged_sql(db).is_empty());
            }

            Ok(())
        }

        #[tokio::test]
        async fn failing_room_close_does_not_undo_completion() -> Result<(), Error> {
            let live = academic_model(1, SessionStatus::Ready);
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![live.clone()]])
                .append_query_results([vec![completed_row(&live)]])
                .into_connection();

            let mut meetings = MockMeetingService::new();
            meetings.expect_end_meeting().times(1).returning(|_| {
                Err(Error::config("LIVEKIT_URL"))
            });
            let service = SessionStatusService::new(TimingDefaults::default(), Arc::new(meetings));

            let session = Session::Academic { session: live };
            assert!(
                service
                    .auto_complete_if_expired(&db, &session, None, Some(at(11, 10)))
                    .await?
            );

            Ok(())
        }

        #[tokio::test]
        async fn resolve_without_kind_prefers_interactive_sessions() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![interactive_model(7, SessionStatus::Scheduled)]])
                .append_query_results([vec![course(None, None)]])
                .into_connection();

            let session = service().resolve_session(&db, 7, &user(), None).await?;

            assert_eq!(
                session.map(|session| session.reference()),
                Some(SessionRef {
                    kind: SessionKind::Interactive,
                    id: 7
                })
            );

            let sql = logged_sql(db);
            assert_eq!(sql.len(), 2);
            assert!(sql[0].contains(r#""interactive_courses"."academy_id" = "#));

            Ok(())
        }

        #[tokio::test]
        async fn resolve_without_kind_falls_through_to_academic() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([vec![academic_model(7, SessionStatus::Scheduled)]])
                .into_connection();

            let session = service().resolve_session(&db, 7, &user(), None).await?;

            assert_eq!(session.map(|session| session.kind()), Some(SessionKind::Academic));
            Ok(())
        }

        #[tokio::test]
        async fn resolve_with_kind_only_queries_that_table() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran_model(7, SessionStatus::Scheduled)]])
                .append_query_results([Vec::<quran_individual_circles::Model>::new()])
                .into_connection();

            let session = service()
                .resolve_session(&db, 7, &user(), Some(SessionKind::Quran))
                .await?;

            assert_eq!(session.map(|session| session.kind()), Some(SessionKind::Quran));

            let sql = logged_sql(db);
            assert!(sql[0].contains(r#""quran_sessions"."academy_id" = "#));
            assert!(sql[1].contains("quran_individual_circles"));
            Ok(())
        }

        #[tokio::test]
        async fn resolve_returns_none_when_no_table_has_the_session() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([Vec::<academic_sessions::Model>::new()])
                .append_query_results([Vec::<entity::quran_sessions::Model>::new()])
                .into_connection();

            assert_eq!(service().resolve_session(&db, 7, &user(), None).await?, None);
            Ok(())
        }

        #[tokio::test]
        async fn sweep_completes_overdue_sessions_of_every_kind() -> Result<(), Error> {
            let quran = quran_model(1, SessionStatus::Ongoing);
            let completed_quran = entity::quran_sessions::Model {
                status: SessionStatus::Completed,
                ..quran.clone()
            };
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran.clone()]])
                .append_query_results([Vec::<quran_individual_circles::Model>::new()])
                .append_query_results([Vec::<academic_sessions::Model>::new()])
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([vec![quran]])
                .append_query_results([vec![completed_quran]])
                .into_connection();

            let mut meetings = MockMeetingService::new();
            meetings
                .expect_end_meeting()
                .withf(|room| room == "quran-room")
                .times(1)
                .returning(|_| Ok(()));
            let service = SessionStatusService::new(TimingDefaults::default(), Arc::new(meetings));

            let report = service.sweep_expired_sessions(&db, Some(at(12, 0))).await?;

            assert_eq!(
                report,
                SweepReport {
                    examined: 1,
                    completed: 1,
                    failed: vec![]
                }
            );
            Ok(())
        }

        #[tokio::test]
        async fn sweep_keeps_going_when_a_session_fails_to_load() -> Result<(), Error> {
            let academic = academic_model(2, SessionStatus::Ongoing);
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran_model(1, SessionStatus::Ongoing)]])
                .append_query_errors([DbErr::Custom("circle lookup failed".to_string())])
                .append_query_results([vec![academic.clone()]])
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([vec![academic.clone()]])
                .append_query_results([vec![completed_row(&academic)]])
                .into_connection();

            let mut meetings = MockMeetingService::new();
            meetings
                .expect_end_meeting()
                .withf(|room| room == "academic-room")
                .times(1)
                .returning(|_| Ok(()));
            let service = SessionStatusService::new(TimingDefaults::default(), Arc::new(meetings));

            let report = service.sweep_expired_sessions(&db, Some(at(12, 0))).await?;

            assert_eq!(
                report,
                SweepReport {
                    examined: 2,
                    completed: 1,
                    failed: vec![SessionRef {
                        kind: SessionKind::Quran,
                        id: 1
                    }]
                }
            );
            Ok(())
        }
    }
}
