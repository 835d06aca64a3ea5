//! The three session kinds behind one type.
//!
//! Session ids are only unique within a kind, so a session is always addressed by
//! [`SessionRef`]. Timing overrides live on the Quran circle or the interactive course;
//! [`Session`] carries whichever one applies so timing can be resolved without I/O.

use crate::error::Error;
use chrono::{DateTime, Utc};
use entity::{
    academic_sessions, interactive_course_sessions, interactive_courses,
    quran_session_type::QuranSessionType, quran_sessions, session_kind::SessionKind,
    session_status::SessionStatus, Id,
};
use log::*;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use serde_json::Value;
use service::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionRef {
    pub kind: SessionKind,
    pub id: Id,
}

impl std::fmt::Display for SessionRef {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{} session {}", self.kind, self.id)
    }
}

/// Timing overrides of the circle a Quran session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CircleTiming {
    pub preparation_minutes: Option<i32>,
    pub ending_buffer_minutes: Option<i32>,
}

/// Platform-wide timing used when nothing more specific is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingDefaults {
    pub preparation_minutes: i64,
    pub buffer_minutes: i64,
    pub duration_minutes: i64,
}

impl Default for TimingDefaults {
    fn default() -> Self {
        Self {
            preparation_minutes: 15,
            buffer_minutes: 5,
            duration_minutes: 60,
        }
    }
}

impl From<&Config> for TimingDefaults {
    fn from(config: &Config) -> Self {
        Self {
            preparation_minutes: config.default_preparation_minutes,
            buffer_minutes: config.default_buffer_minutes,
            duration_minutes: config.default_duration_minutes,
        }
    }
}

/// Resolved preparation and buffer minutes for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionTiming {
    pub preparation_minutes: i64,
    pub buffer_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Quran {
        session: quran_sessions::Model,
        circle: Option<CircleTiming>,
    },
    Academic {
        session: academic_sessions::Model,
    },
    Interactive {
        session: interactive_course_sessions::Model,
        course: Option<interactive_courses::Model>,
    },
}

impl Session {
    /// Wraps a Quran session together with the timing of its circle. Individual
    /// sessions read their individual circle, group sessions their group circle.
    pub async fn quran(
        db: &impl ConnectionTrait,
        session: quran_sessions::Model,
    ) -> Result<Self, Error> {
        let circle = match session.session_type {
            QuranSessionType::Individual => match session.individual_circle_id {
                Some(id) => entity_api::quran_circle::find_individual_circle(db, id)
                    .await?
                    .map(|circle| CircleTiming {
                        preparation_minutes: circle.preparation_minutes,
                        ending_buffer_minutes: circle.ending_buffer_minutes,
                    }),
                None => None,
            },
            QuranSessionType::Group => match session.circle_id {
                Some(id) => entity_api::quran_circle::find_group_circle(db, id)
                    .await?
                    .map(|circle| CircleTiming {
                        preparation_minutes: circle.preparation_minutes,
                        ending_buffer_minutes: circle.ending_buffer_minutes,
                    }),
                None => None,
            },
        };

        if circle.is_none() {
            debug!("Quran session {} has no circle, using default timing", session.id);
        }

        Ok(Session::Quran { session, circle })
    }

    pub async fn interactive(
        db: &impl ConnectionTrait,
        session: interactive_course_sessions::Model,
    ) -> Result<Self, Error> {
        let course = entity_api::interactive_course::find_by_id(db, session.course_id).await?;
        Ok(Session::Interactive { session, course })
    }

    /// Looks a session up in the table of `kind`, restricted to `academy_id` when given.
    pub async fn find_in_academy(
        db: &impl ConnectionTrait,
        kind: SessionKind,
        id: Id,
        academy_id: Option<Id>,
    ) -> Result<Option<Self>, Error> {
        let session = match kind {
            SessionKind::Quran => {
                match entity_api::quran_session::find_in_academy(db, id, academy_id).await? {
                    Some(session) => Some(Self::quran(db, session).await?),
                    None => None,
                }
            }
            SessionKind::Academic => {
                entity_api::academic_session::find_in_academy(db, id, academy_id)
                    .await?
                    .map(|session| Session::Academic { session })
            }
            SessionKind::Interactive => {
                match entity_api::interactive_course_session::find_in_academy(db, id, academy_id)
                    .await?
                {
                    Some(session) => Some(Self::interactive(db, session).await?),
                    None => None,
                }
            }
        };

        Ok(session)
    }

    pub fn kind(&self) -> SessionKind {
        match self {
            Session::Quran { .. } => SessionKind::Quran,
            Session::Academic { .. } => SessionKind::Academic,
            Session::Interactive { .. } => SessionKind::Interactive,
        }
    }

    pub fn id(&self) -> Id {
        match self {
            Session::Quran { session, .. } => session.id,
            Session::Academic { session } => session.id,
            Session::Interactive { session, .. } => session.id,
        }
    }

    pub fn reference(&self) -> SessionRef {
        SessionRef {
            kind: self.kind(),
            id: self.id(),
        }
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        let scheduled_at = match self {
            Session::Quran { session, .. } => session.scheduled_at,
            Session::Academic { session } => session.scheduled_at,
            Session::Interactive { session, .. } => session.scheduled_at,
        };
        scheduled_at.map(|at| at.with_timezone(&Utc))
    }

    pub fn duration_minutes(&self) -> Option<i32> {
        match self {
            Session::Quran { session, .. } => session.duration_minutes,
            Session::Academic { session } => session.duration_minutes,
            Session::Interactive { session, .. } => session.duration_minutes,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            Session::Quran { session, .. } => session.status,
            Session::Academic { session } => session.status,
            Session::Interactive { session, .. } => session.status,
        }
    }

    pub fn meeting_room_name(&self) -> Option<&str> {
        match self {
            Session::Quran { session, .. } => session.meeting_room_name.as_deref(),
            Session::Academic { session } => session.meeting_room_name.as_deref(),
            Session::Interactive { session, .. } => session.meeting_room_name.as_deref(),
        }
    }

    /// Interactive sessions belong to the academy of their course, so this is `None`
    /// when the course was not loaded.
    pub fn academy_id(&self) -> Option<Id> {
        match self {
            Session::Quran { session, .. } => Some(session.academy_id),
            Session::Academic { session } => Some(session.academy_id),
            Session::Interactive { course, .. } => course.as_ref().map(|course| course.academy_id),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Session::Quran { session, .. } => session.title.as_deref(),
            Session::Academic { session } => session.title.as_deref(),
            Session::Interactive { session, .. } => session.title.as_deref(),
        }
    }

    pub fn timing(&self, defaults: &TimingDefaults) -> SessionTiming {
        let (preparation, buffer) = match self {
            Session::Academic { .. } => (None, None),
            Session::Quran { circle, .. } => circle
                .map(|circle| (circle.preparation_minutes, circle.ending_buffer_minutes))
                .unwrap_or_default(),
            Session::Interactive { course, .. } => course
                .as_ref()
                .map(|course| (course.preparation_minutes, course.buffer_minutes))
                .unwrap_or_default(),
        };

        SessionTiming {
            preparation_minutes: preparation.map_or(defaults.preparation_minutes, i64::from),
            buffer_minutes: buffer.map_or(defaults.buffer_minutes, i64::from),
        }
    }

    /// The stored row as JSON, used as event payload.
    pub fn to_json(&self) -> Value {
        let value = match self {
            Session::Quran { session, .. } => serde_json::to_value(session),
            Session::Academic { session } => serde_json::to_value(session),
            Session::Interactive { session, .. } => serde_json::to_value(session),
        };
        value.unwrap_or_else(|err| {
            warn!("Failed to serialize {}: {err}", self.reference());
            Value::Null
        })
    }
}
