//! A student's sessions across the three session kinds.
//!
//! Every listing queries each kind separately, formats the rows into one shape and
//! merges them by their real start time. Related rows (teachers, courses,
//! subscriptions) are batch loaded once per listing.

use crate::clock::{AcademyContext, Clock, SystemClock};
use crate::error::Error;
use crate::join_window::{JoinPolicy, JoinWindow};
use crate::messages::{ArabicCatalog, MessageCatalog};
use crate::session::Session;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use entity::{
    academic_sessions, academic_subscriptions, academic_teacher_profiles,
    attendance_status::AttendanceStatus, interactive_course_sessions, interactive_courses,
    meeting_attendances, quran_sessions, session_kind::SessionKind,
    session_status::SessionStatus, users, Id,
};
use entity_api::{SessionFilters, SortOrder};
use log::*;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use service::config::Config;
use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    /// Duration assumed for sessions that have none
    pub duration_minutes: i64,
    /// How long before the start a listed session shows as joinable
    pub join_lead_minutes: i64,
    pub upcoming_days: i64,
    pub upcoming_limit: u64,
    pub storage_base_url: String,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            duration_minutes: 45,
            join_lead_minutes: 10,
            upcoming_days: 14,
            upcoming_limit: 20,
            storage_base_url: "/storage".to_string(),
        }
    }
}

impl From<&Config> for ListingSettings {
    fn from(config: &Config) -> Self {
        Self {
            duration_minutes: config.listing_duration_minutes,
            join_lead_minutes: config.listing_join_lead_minutes,
            upcoming_days: config.upcoming_days,
            upcoming_limit: config.upcoming_limit,
            storage_base_url: config.storage_base_url().to_string(),
        }
    }
}

/// Optional narrowing of a student's session history. Dates are whole academy-local days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentSessionQuery {
    pub kind: Option<SessionKind>,
    pub status: Option<SessionStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherSummary {
    pub id: Id,
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: SessionKind,
    pub title: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub status: SessionStatus,
    pub status_label: String,
    pub teacher: Option<TeacherSummary>,
    pub can_join: bool,
    pub has_meeting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingInfo {
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuranDetails {
    pub from_surah: Option<i32>,
    pub from_verse: Option<i32>,
    pub to_surah: Option<i32>,
    pub to_verse: Option<i32>,
    pub pages_count: Option<i32>,
    pub memorization_quality: Option<String>,
    pub tajweed_quality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicDetails {
    pub subject: Option<String>,
    pub homework: Option<String>,
    pub homework_due_date: Option<DateTime<Utc>>,
    pub topics_covered: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseDetails {
    pub course_id: Id,
    pub course_title: Option<String>,
    pub session_number: i32,
    pub total_sessions: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceInfo {
    pub status: Option<AttendanceStatus>,
    pub attended_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub student_rating: Option<i32>,
    pub student_feedback: Option<String>,
    pub meeting: Option<MeetingInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quran_details: Option<QuranDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_details: Option<AcademicDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_details: Option<CourseDetails>,
    pub attendance: Option<AttendanceInfo>,
}

/// Why feedback was or was not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Submitted,
    /// No such session for this student
    NotFound,
    NotCompleted,
    AlreadyRated,
    /// Ratings go from 1 to 5
    InvalidRating,
}

#[derive(Debug, Default)]
struct SessionRows {
    quran: Vec<quran_sessions::Model>,
    academic: Vec<academic_sessions::Model>,
    interactive: Vec<interactive_course_sessions::Model>,
}

#[derive(Debug, Default)]
struct RelatedData {
    users: HashMap<Id, users::Model>,
    profiles: HashMap<Id, academic_teacher_profiles::Model>,
    subscriptions: HashMap<Id, academic_subscriptions::Model>,
    courses: HashMap<Id, interactive_courses::Model>,
}

impl RelatedData {
    async fn load(db: &impl ConnectionTrait, rows: &SessionRows) -> Result<Self, Error> {
        let subscription_ids = unique(rows.academic.iter().filter_map(|s| s.academic_subscription_id));
        let subscriptions =
            entity_api::academic_subscription::batch_load(db, &subscription_ids).await?;

        let course_ids = unique(rows.interactive.iter().map(|s| s.course_id));
        let courses = entity_api::interactive_course::batch_load(db, &course_ids).await?;

        let profile_ids = unique(
            rows.academic
                .iter()
                .filter_map(|s| s.academic_teacher_id)
                .chain(courses.values().filter_map(|c| c.assigned_teacher_id)),
        );
        let profiles = entity_api::academic_teacher_profile::batch_load(db, &profile_ids).await?;

        let user_ids = unique(
            rows.quran
                .iter()
                .filter_map(|s| s.quran_teacher_id)
                .chain(profiles.values().map(|p| p.user_id)),
        );
        let users = entity_api::user::batch_load(db, &user_ids).await?;

        Ok(Self {
            users,
            profiles,
            subscriptions,
            courses,
        })
    }

    fn profile_user(&self, profile_id: Option<Id>) -> Option<&users::Model> {
        profile_id
            .and_then(|id| self.profiles.get(&id))
            .and_then(|profile| self.users.get(&profile.user_id))
    }
}

fn unique(ids: impl Iterator<Item = Id>) -> Vec<Id> {
    let mut ids: Vec<Id> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub struct StudentSessionService {
    settings: ListingSettings,
    catalog: Arc<dyn MessageCatalog>,
    clock: Arc<dyn Clock>,
}

impl StudentSessionService {
    pub fn new(settings: ListingSettings) -> Self {
        Self {
            settings,
            catalog: Arc::new(ArabicCatalog),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Session history, newest first.
    pub async fn get_student_sessions(
        &self,
        db: &impl ConnectionTrait,
        academy: &AcademyContext,
        student_id: Id,
        query: &StudentSessionQuery,
    ) -> Result<Vec<SessionSummary>, Error> {
        let from = query
            .date_from
            .map_or(Bound::Unbounded, |date| Bound::Included(academy.start_of_day(date)));
        let until = query.date_to.map_or(Bound::Unbounded, |date| {
            match date.succ_opt() {
                Some(next) => Bound::Excluded(academy.start_of_day(next)),
                None => Bound::Unbounded,
            }
        });

        let filters = SessionFilters::new()
            .with_status(query.status)
            .scheduled_between(from, until)
            .ordered(SortOrder::Desc);

        let mut sessions = self
            .summaries(db, student_id, query.kind, &filters, None)
            .await?;
        sessions.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

        Ok(sessions)
    }

    /// Sessions on the academy-local current day, earliest first.
    pub async fn get_today_sessions(
        &self,
        db: &impl ConnectionTrait,
        academy: &AcademyContext,
        student_id: Id,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionSummary>, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());
        let (start, end) = academy.day_bounds(now);

        let filters = SessionFilters::new()
            .scheduled_between(Bound::Included(start), Bound::Excluded(end))
            .ordered(SortOrder::Asc);

        let mut sessions = self
            .summaries(db, student_id, None, &filters, Some(now))
            .await?;
        sessions.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));

        Ok(sessions)
    }

    /// The next `limit` sessions that are neither cancelled nor completed, starting
    /// after `now` and within `days`. Each kind contributes at most `limit` rows, so the
    /// merged result is the exact first `limit` across kinds.
    pub async fn get_upcoming_sessions(
        &self,
        db: &impl ConnectionTrait,
        student_id: Id,
        days: Option<i64>,
        limit: Option<u64>,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionSummary>, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());
        let days = days.unwrap_or(self.settings.upcoming_days);
        let limit = limit.unwrap_or(self.settings.upcoming_limit);

        // A horizon beyond the representable range is no horizon at all
        let until = TimeDelta::try_days(days)
            .and_then(|horizon| now.checked_add_signed(horizon))
            .map_or(Bound::Unbounded, Bound::Included);

        let filters = SessionFilters::new()
            .excluding(&[SessionStatus::Cancelled, SessionStatus::Completed])
            .scheduled_between(Bound::Excluded(now), until)
            .ordered(SortOrder::Asc)
            .limit(limit);

        let mut sessions = self
            .summaries(db, student_id, None, &filters, Some(now))
            .await?;
        sessions.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        sessions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(sessions)
    }

    pub async fn get_session_detail(
        &self,
        db: &impl ConnectionTrait,
        student_id: Id,
        kind: SessionKind,
        session_id: Id,
        now: Option<DateTime<Utc>>,
    ) -> Result<Option<SessionDetail>, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());

        let mut rows = SessionRows::default();
        match kind {
            SessionKind::Quran => rows.quran.extend(
                entity_api::quran_session::find_by_id_for_student(db, session_id, student_id)
                    .await?,
            ),
            SessionKind::Academic => rows.academic.extend(
                entity_api::academic_session::find_by_id_for_student(db, session_id, student_id)
                    .await?,
            ),
            SessionKind::Interactive => rows.interactive.extend(
                entity_api::interactive_course_session::find_by_id_for_student(
                    db, session_id, student_id,
                )
                .await?,
            ),
        }

        if rows.quran.is_empty() && rows.academic.is_empty() && rows.interactive.is_empty() {
            debug!("Student {student_id} has no {kind} session {session_id}");
            return Ok(None);
        }

        let related = RelatedData::load(db, &rows).await?;
        let attendance =
            entity_api::meeting_attendance::find_for_user(db, kind, session_id, student_id)
                .await?
                .map(attendance_info);

        let detail = if let Some(session) = rows.quran.pop() {
            self.quran_detail(session, &related, now)
        } else if let Some(session) = rows.academic.pop() {
            self.academic_detail(session, &related, now)
        } else if let Some(session) = rows.interactive.pop() {
            self.interactive_detail(session, &related, now)
        } else {
            return Ok(None);
        };

        Ok(Some(SessionDetail {
            attendance,
            ..detail
        }))
    }

    /// Stores a 1 to 5 rating with optional feedback on a completed session the student
    /// owns. A session is rated at most once.
    pub async fn submit_feedback(
        &self,
        db: &impl ConnectionTrait,
        student_id: Id,
        kind: SessionKind,
        session_id: Id,
        rating: i32,
        feedback: Option<String>,
    ) -> Result<FeedbackOutcome, Error> {
        if !(1..=5).contains(&rating) {
            return Ok(FeedbackOutcome::InvalidRating);
        }

        let current = match kind {
            SessionKind::Quran => {
                entity_api::quran_session::find_by_id_for_student(db, session_id, student_id)
                    .await?
                    .map(|s| (s.status, s.student_rating))
            }
            SessionKind::Academic => {
                entity_api::academic_session::find_by_id_for_student(db, session_id, student_id)
                    .await?
                    .map(|s| (s.status, s.student_rating))
            }
            SessionKind::Interactive => {
                entity_api::interactive_course_session::find_by_id_for_student(
                    db, session_id, student_id,
                )
                .await?
                .map(|s| (s.status, s.student_rating))
            }
        };

        match current {
            None => return Ok(FeedbackOutcome::NotFound),
            Some((status, _)) if status != SessionStatus::Completed => {
                return Ok(FeedbackOutcome::NotCompleted)
            }
            Some((_, Some(_))) => return Ok(FeedbackOutcome::AlreadyRated),
            Some(_) => {}
        }

        let stored = match kind {
            SessionKind::Quran => {
                entity_api::quran_session::record_feedback(db, session_id, rating, feedback).await?
            }
            SessionKind::Academic => {
                entity_api::academic_session::record_feedback(db, session_id, rating, feedback)
                    .await?
            }
            SessionKind::Interactive => {
                entity_api::interactive_course_session::record_feedback(
                    db, session_id, rating, feedback,
                )
                .await?
            }
        };

        if stored {
            info!("Student {student_id} rated {kind} session {session_id}");
            Ok(FeedbackOutcome::Submitted)
        } else {
            // Another submission won between the read and the update.
            Ok(FeedbackOutcome::AlreadyRated)
        }
    }

    async fn fetch(
        &self,
        db: &impl ConnectionTrait,
        student_id: Id,
        kind: Option<SessionKind>,
        filters: &SessionFilters,
    ) -> Result<SessionRows, Error> {
        let wants = |wanted: SessionKind| kind.is_none() || kind == Some(wanted);
        let mut rows = SessionRows::default();

        if wants(SessionKind::Quran) {
            rows.quran = entity_api::quran_session::find_for_student(db, student_id, filters).await?;
        }
        if wants(SessionKind::Academic) {
            rows.academic =
                entity_api::academic_session::find_for_student(db, student_id, filters).await?;
        }
        if wants(SessionKind::Interactive) {
            rows.interactive =
                entity_api::interactive_course_session::find_for_student(db, student_id, filters)
                    .await?;
        }

        debug!(
            "Student {student_id}: {} quran, {} academic, {} interactive sessions",
            rows.quran.len(),
            rows.academic.len(),
            rows.interactive.len()
        );

        Ok(rows)
    }

    async fn summaries(
        &self,
        db: &impl ConnectionTrait,
        student_id: Id,
        kind: Option<SessionKind>,
        filters: &SessionFilters,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionSummary>, Error> {
        let now = now.unwrap_or_else(|| self.clock.now());
        let rows = self.fetch(db, student_id, kind, filters).await?;
        let related = RelatedData::load(db, &rows).await?;

        let SessionRows {
            quran,
            academic,
            interactive,
        } = rows;

        Ok(quran
            .into_iter()
            .map(|session| self.quran_detail(session, &related, now).summary)
            .chain(
                academic
                    .into_iter()
                    .map(|session| self.academic_detail(session, &related, now).summary),
            )
            .chain(
                interactive
                    .into_iter()
                    .map(|session| self.interactive_detail(session, &related, now).summary),
            )
            .collect())
    }

    fn summary(
        &self,
        session: &Session,
        title: Option<String>,
        teacher: Option<&users::Model>,
        now: DateTime<Utc>,
    ) -> SessionSummary {
        let status = session.status();
        let can_join = !status.is_terminal()
            && session.scheduled_at().is_some_and(|scheduled_at| {
                let policy = JoinPolicy::Listing {
                    lead_minutes: self.settings.join_lead_minutes,
                    default_duration: self.settings.duration_minutes,
                };
                JoinWindow::compute(scheduled_at, session.duration_minutes(), &policy).contains(now)
            });

        SessionSummary {
            id: session.id(),
            kind: session.kind(),
            title: title.unwrap_or_else(|| self.catalog.default_title(session.kind())),
            scheduled_at: session.scheduled_at(),
            duration_minutes: session
                .duration_minutes()
                .map_or(self.settings.duration_minutes, i64::from),
            status,
            status_label: self.catalog.status_label(status),
            teacher: teacher.map(|teacher| self.teacher_summary(teacher)),
            can_join,
            has_meeting: session.meeting_room_name().is_some(),
        }
    }

    fn teacher_summary(&self, teacher: &users::Model) -> TeacherSummary {
        TeacherSummary {
            id: teacher.id,
            name: teacher.name.clone(),
            avatar: teacher.avatar.as_deref().map(|path| {
                format!(
                    "{}/{}",
                    self.settings.storage_base_url.trim_end_matches('/'),
                    path.trim_start_matches('/')
                )
            }),
        }
    }

    fn quran_detail(
        &self,
        model: quran_sessions::Model,
        related: &RelatedData,
        now: DateTime<Utc>,
    ) -> SessionDetail {
        let teacher = model.quran_teacher_id.and_then(|id| related.users.get(&id));
        let title = model.title.clone();
        let details = QuranDetails {
            from_surah: model.from_surah,
            from_verse: model.from_verse,
            to_surah: model.to_surah,
            to_verse: model.to_verse,
            pages_count: model.pages_count,
            memorization_quality: model.memorization_quality.clone(),
            tajweed_quality: model.tajweed_quality.clone(),
        };
        let description = model.description.clone();
        let notes = model.teacher_notes.clone();
        let student_rating = model.student_rating;
        let student_feedback = model.student_feedback.clone();

        let session = Session::Quran {
            session: model,
            circle: None,
        };

        SessionDetail {
            summary: self.summary(&session, title, teacher, now),
            description,
            notes,
            student_rating,
            student_feedback,
            meeting: meeting_info(&session),
            quran_details: Some(details),
            academic_details: None,
            course_details: None,
            attendance: None,
        }
    }

    fn academic_detail(
        &self,
        model: academic_sessions::Model,
        related: &RelatedData,
        now: DateTime<Utc>,
    ) -> SessionDetail {
        let teacher = related.profile_user(model.academic_teacher_id);
        let subject = model
            .academic_subscription_id
            .and_then(|id| related.subscriptions.get(&id))
            .and_then(|subscription| subscription.subject_name.clone());
        let title = model.title.clone().or_else(|| subject.clone());
        let details = AcademicDetails {
            subject,
            homework: model.homework.clone(),
            homework_due_date: model.homework_due_date.map(|at| at.with_timezone(&Utc)),
            topics_covered: model.topics_covered.clone(),
        };
        let description = model.description.clone();
        let notes = model.notes.clone();
        let student_rating = model.student_rating;
        let student_feedback = model.student_feedback.clone();

        let session = Session::Academic { session: model };

        SessionDetail {
            summary: self.summary(&session, title, teacher, now),
            description,
            notes,
            student_rating,
            student_feedback,
            meeting: meeting_info(&session),
            quran_details: None,
            academic_details: Some(details),
            course_details: None,
            attendance: None,
        }
    }

    fn interactive_detail(
        &self,
        model: interactive_course_sessions::Model,
        related: &RelatedData,
        now: DateTime<Utc>,
    ) -> SessionDetail {
        let course = related.courses.get(&model.course_id).cloned();
        let teacher = course
            .as_ref()
            .and_then(|course| related.profile_user(course.assigned_teacher_id));
        let title = model
            .title
            .clone()
            .or_else(|| course.as_ref().map(|course| course.title.clone()));
        let details = CourseDetails {
            course_id: model.course_id,
            course_title: course.as_ref().map(|course| course.title.clone()),
            session_number: model.session_number,
            total_sessions: course.as_ref().and_then(|course| course.total_sessions),
        };
        let description = model.description.clone();
        let student_rating = model.student_rating;
        let student_feedback = model.student_feedback.clone();

        let session = Session::Interactive {
            session: model,
            course,
        };

        SessionDetail {
            summary: self.summary(&session, title, teacher, now),
            description,
            notes: None,
            student_rating,
            student_feedback,
            meeting: meeting_info(&session),
            quran_details: None,
            academic_details: None,
            course_details: Some(details),
            attendance: None,
        }
    }
}

fn meeting_info(session: &Session) -> Option<MeetingInfo> {
    session.meeting_room_name().map(|room_name| MeetingInfo {
        room_name: room_name.to_string(),
    })
}

fn attendance_info(attendance: meeting_attendances::Model) -> AttendanceInfo {
    AttendanceInfo {
        status: attendance.attendance_status,
        attended_at: attendance.first_join_time.map(|at| at.with_timezone(&Utc)),
        left_at: attendance.last_leave_time.map(|at| at.with_timezone(&Utc)),
        duration_minutes: attendance.total_duration_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::*;
    use entity::roles::Role;

    fn service() -> StudentSessionService {
        StudentSessionService::new(ListingSettings::default())
    }

    fn teacher() -> users::Model {
        users::Model {
            id: 9,
            academy_id: Some(3),
            name: "Teacher".to_string(),
            email: "teacher@example.com".to_string(),
            avatar: Some("avatars/9.png".to_string()),
            role: Role::QuranTeacher,
            created_at: at(8, 0).into(),
            updated_at: at(8, 0).into(),
        }
    }

    fn related_with_teacher() -> RelatedData {
        RelatedData {
            users: HashMap::from([(9, teacher())]),
            ..RelatedData::default()
        }
    }

    #[test]
    fn quran_summary_falls_back_to_the_default_title() {
        let summary = service()
            .quran_detail(quran_model(1, SessionStatus::Scheduled), &related_with_teacher(), at(9, 0))
            .summary;

        assert_eq!(summary.title, "جلسة قرآنية");
        assert_eq!(summary.status_label, "مجدولة");
        assert_eq!(
            summary.teacher,
            Some(TeacherSummary {
                id: 9,
                name: "Teacher".to_string(),
                avatar: Some("/storage/avatars/9.png".to_string()),
            })
        );
        assert!(summary.has_meeting);
    }

    #[test]
    fn academic_title_prefers_the_subscription_subject() {
        let related = RelatedData {
            subscriptions: HashMap::from([(
                4,
                academic_subscriptions::Model {
                    id: 4,
                    academy_id: 3,
                    student_id: 42,
                    subject_name: Some("Physics".to_string()),
                    created_at: at(8, 0).into(),
                    updated_at: at(8, 0).into(),
                },
            )]),
            ..RelatedData::default()
        };

        let detail = service().academic_detail(
            academic_model(1, SessionStatus::Scheduled),
            &related,
            at(9, 0),
        );

        assert_eq!(detail.summary.title, "Physics");
        assert_eq!(
            detail.academic_details.and_then(|details| details.subject),
            Some("Physics".to_string())
        );
    }

    #[test]
    fn interactive_title_falls_back_to_the_course() {
        let related = RelatedData {
            courses: HashMap::from([(5, course(None, None))]),
            ..RelatedData::default()
        };

        let detail = service().interactive_detail(
            interactive_model(1, SessionStatus::Scheduled),
            &related,
            at(9, 0),
        );

        assert_eq!(detail.summary.title, "Algebra");
        assert_eq!(
            detail.course_details,
            Some(CourseDetails {
                course_id: 5,
                course_title: Some("Algebra".to_string()),
                session_number: 3,
                total_sessions: Some(12),
            })
        );
    }

    #[test]
    fn listing_join_flag_uses_the_lead_window() {
        let service = service();
        let related = RelatedData::default();
        let summary_at = |status, now| {
            service
                .quran_detail(quran_model(1, status), &related, now)
                .summary
                .can_join
        };

        assert!(!summary_at(SessionStatus::Scheduled, at(9, 49)));
        assert!(summary_at(SessionStatus::Scheduled, at(9, 50)));
        assert!(summary_at(SessionStatus::Ongoing, at(11, 0)));
        assert!(!summary_at(SessionStatus::Ongoing, at(11, 1)));
        assert!(!summary_at(SessionStatus::Cancelled, at(10, 0)));
        assert!(!summary_at(SessionStatus::Completed, at(10, 0)));
    }

    #[test]
    fn missing_duration_uses_the_listing_default() {
        let mut model = quran_model(1, SessionStatus::Scheduled);
        model.duration_minutes = None;

        let summary = service()
            .quran_detail(model, &RelatedData::default(), at(9, 0))
            .summary;

        assert_eq!(summary.duration_minutes, 45);
    }

    #[test]
    fn summary_serializes_its_kind_as_type() {
        let summary = service()
            .academic_detail(academic_model(1, SessionStatus::Ready), &RelatedData::default(), at(9, 0))
            .summary;

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "academic");
        assert_eq!(json["title"], "جلسة أكاديمية");
    }

    #[cfg(feature = "mock")]
    mod database {
        use super::*;
        use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

        fn unrelated_academic(id: Id, hour: u32) -> academic_sessions::Model {
            academic_sessions::Model {
                academic_teacher_id: None,
                academic_subscription_id: None,
                scheduled_at: Some(at(hour, 0).into()),
                ..academic_model(id, SessionStatus::Scheduled)
            }
        }

        fn quran_at(id: Id, hour: u32) -> quran_sessions::Model {
            quran_sessions::Model {
                scheduled_at: Some(at(hour, 0).into()),
                ..quran_model(id, SessionStatus::Scheduled)
            }
        }

        #[tokio::test]
        async fn upcoming_merges_kinds_by_start_time() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran_at(1, 13), quran_at(2, 15)]])
                .append_query_results([vec![unrelated_academic(1, 14)]])
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([vec![teacher()]])
                .into_connection();

            let sessions = service()
                .get_upcoming_sessions(&db, 42, None, Some(2), Some(at(12, 0)))
                .await?;

            let order: Vec<(SessionKind, Id)> =
                sessions.iter().map(|s| (s.kind, s.id)).collect();
            assert_eq!(
                order,
                vec![(SessionKind::Quran, 1), (SessionKind::Academic, 1)]
            );

            let sql = logged_sql(db);
            assert!(sql[0].contains("NOT IN"));
            assert!(sql[0].contains("LIMIT"));
            assert!(sql[2].contains("course_enrollments"));
            Ok(())
        }

        #[tokio::test]
        async fn upcoming_with_an_unrepresentable_horizon_has_no_upper_bound() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<quran_sessions::Model>::new()])
                .append_query_results([Vec::<academic_sessions::Model>::new()])
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .into_connection();

            let sessions = service()
                .get_upcoming_sessions(&db, 42, Some(i64::MAX / 1000), Some(5), Some(at(12, 0)))
                .await?;

            assert!(sessions.is_empty());
            let sql = logged_sql(db);
            assert!(sql[0].contains(r#""quran_sessions"."scheduled_at" > "#));
            assert!(!sql[0].contains(r#""quran_sessions"."scheduled_at" <= "#));
            Ok(())
        }

        #[tokio::test]
        async fn today_uses_the_academy_day_and_merges_kinds_earliest_first() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran_at(1, 23)]])
                .append_query_results([vec![unrelated_academic(2, 22)]])
                .append_query_results([Vec::<interactive_course_sessions::Model>::new()])
                .append_query_results([vec![teacher()]])
                .into_connection();
            // 22:30 UTC on Jan 1st is Jan 2nd in Riyadh, which runs 21:00 to 21:00 UTC
            let academy = AcademyContext::new(Some(3), chrono_tz::Asia::Riyadh);

            let sessions = service()
                .get_today_sessions(&db, &academy, 42, Some(at(22, 30)))
                .await?;

            let order: Vec<(SessionKind, Id)> =
                sessions.iter().map(|s| (s.kind, s.id)).collect();
            assert_eq!(
                order,
                vec![(SessionKind::Academic, 2), (SessionKind::Quran, 1)]
            );

            let sql = logged_sql(db);
            for (stmt, table) in sql.iter().zip(["quran_sessions", "academic_sessions"]) {
                assert!(stmt.contains(&format!(r#""{table}"."scheduled_at" >= "#)));
                assert!(stmt.contains(&format!(r#""{table}"."scheduled_at" < "#)));
                assert!(stmt.contains("2025-01-01 21:00:00"));
                assert!(stmt.contains("2025-01-02 21:00:00"));
            }
            assert!(sql[1].contains(r#"ORDER BY "academic_sessions"."scheduled_at" ASC"#));
            Ok(())
        }

        #[tokio::test]
        async fn history_of_one_kind_is_newest_first() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![unrelated_academic(1, 9), unrelated_academic(2, 11)]])
                .into_connection();

            let query = StudentSessionQuery {
                kind: Some(SessionKind::Academic),
                date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
                date_to: NaiveDate::from_ymd_opt(2025, 1, 1),
                ..StudentSessionQuery::default()
            };
            let academy = AcademyContext::new(Some(3), chrono_tz::UTC);

            let sessions = service()
                .get_student_sessions(&db, &academy, 42, &query)
                .await?;

            assert_eq!(sessions.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 1]);

            let sql = logged_sql(db);
            assert_eq!(sql.len(), 1);
            assert!(sql[0].contains(r#""academic_sessions"."scheduled_at" >= "#));
            assert!(sql[0].contains(r#""academic_sessions"."scheduled_at" < "#));
            Ok(())
        }

        #[tokio::test]
        async fn interactive_detail_includes_course_teacher_and_attendance() -> Result<(), Error> {
            let profile = academic_teacher_profiles::Model {
                id: 2,
                academy_id: 3,
                user_id: 9,
                created_at: at(8, 0).into(),
                updated_at: at(8, 0).into(),
            };
            let attendance = meeting_attendances::Model {
                id: 1,
                session_kind: SessionKind::Interactive,
                session_id: 7,
                user_id: 42,
                attendance_status: Some(AttendanceStatus::Attended),
                join_count: 2,
                total_duration_minutes: 55,
                first_join_time: Some(at(10, 1).into()),
                last_join_time: Some(at(10, 20).into()),
                last_leave_time: Some(at(11, 0).into()),
                created_at: at(10, 1).into(),
                updated_at: at(11, 0).into(),
            };
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![interactive_model(7, SessionStatus::Completed)]])
                .append_query_results([vec![course(None, None)]])
                .append_query_results([vec![profile]])
                .append_query_results([vec![teacher()]])
                .append_query_results([vec![attendance]])
                .into_connection();

            let detail = service()
                .get_session_detail(&db, 42, SessionKind::Interactive, 7, Some(at(12, 0)))
                .await?
                .expect("session should be found");

            assert_eq!(detail.summary.teacher.map(|t| t.id), Some(9));
            assert_eq!(
                detail.meeting,
                Some(MeetingInfo {
                    room_name: "interactive-room".to_string()
                })
            );
            assert_eq!(
                detail.attendance,
                Some(AttendanceInfo {
                    status: Some(AttendanceStatus::Attended),
                    attended_at: Some(at(10, 1)),
                    left_at: Some(at(11, 0)),
                    duration_minutes: 55,
                })
            );
            Ok(())
        }

        #[tokio::test]
        async fn detail_of_someone_elses_session_is_none() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<quran_sessions::Model>::new()])
                .into_connection();

            let detail = service()
                .get_session_detail(&db, 42, SessionKind::Quran, 7, Some(at(12, 0)))
                .await?;

            assert_eq!(detail, None);
            Ok(())
        }

        #[tokio::test]
        async fn feedback_is_accepted_once() -> Result<(), Error> {
            let completed = academic_model(7, SessionStatus::Completed);
            let rated = academic_sessions::Model {
                student_rating: Some(5),
                ..completed.clone()
            };
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![completed]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([vec![rated]])
                .into_connection();

            let service = service();
            let first = service
                .submit_feedback(&db, 42, SessionKind::Academic, 7, 5, Some("thanks".to_string()))
                .await?;
            let second = service
                .submit_feedback(&db, 42, SessionKind::Academic, 7, 2, None)
                .await?;

            assert_eq!(first, FeedbackOutcome::Submitted);
            assert_eq!(second, FeedbackOutcome::AlreadyRated);
            Ok(())
        }

        #[tokio::test]
        async fn feedback_lost_to_a_concurrent_submission() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![quran_model(7, SessionStatus::Completed)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection();

            let outcome = service()
                .submit_feedback(&db, 42, SessionKind::Quran, 7, 4, None)
                .await?;

            assert_eq!(outcome, FeedbackOutcome::AlreadyRated);
            Ok(())
        }

        #[tokio::test]
        async fn feedback_rejections_are_explained() -> Result<(), Error> {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<academic_sessions::Model>::new()])
                .append_query_results([vec![academic_model(7, SessionStatus::Ongoing)]])
                .into_connection();

            let service = service();
            assert_eq!(
                service
                    .submit_feedback(&db, 42, SessionKind::Academic, 7, 0, None)
                    .await?,
                FeedbackOutcome::InvalidRating
            );
            assert_eq!(
                service
                    .submit_feedback(&db, 42, SessionKind::Academic, 7, 3, None)
                    .await?,
                FeedbackOutcome::NotFound
            );
            assert_eq!(
                service
                    .submit_feedback(&db, 42, SessionKind::Academic, 7, 3, None)
                    .await?,
                FeedbackOutcome::NotCompleted
            );
            Ok(())
        }
    }
}
