//! When a session can be entered.
//!
//! Two policies share one computation. `Eligibility` gates the real join action and
//! knows about roles, preparation time and the ending buffer. `Listing` is the flat
//! window shown in student schedules: a fixed lead before the start until the nominal
//! end, both ends included.

use crate::session::SessionTiming;
use crate::clock::offset_minutes;
use chrono::{DateTime, Utc};
use entity::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Teacher,
    Student,
}

impl From<Role> for Audience {
    fn from(role: Role) -> Self {
        if role.is_teacher() {
            Audience::Teacher
        } else {
            Audience::Student
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    Eligibility {
        audience: Audience,
        timing: SessionTiming,
        default_duration: i64,
    },
    Listing {
        lead_minutes: i64,
        default_duration: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinWindow {
    pub opens: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    closes_inclusive: bool,
}

impl JoinWindow {
    pub fn compute(
        scheduled_at: DateTime<Utc>,
        duration_minutes: Option<i32>,
        policy: &JoinPolicy,
    ) -> Self {
        match *policy {
            JoinPolicy::Eligibility {
                audience,
                timing,
                default_duration,
            } => {
                let lead = match audience {
                    Audience::Teacher => timing.preparation_minutes,
                    Audience::Student => 0,
                };
                let duration = duration_minutes.map_or(default_duration, i64::from);
                JoinWindow {
                    opens: offset_minutes(scheduled_at, lead.saturating_neg()),
                    closes: offset_minutes(
                        scheduled_at,
                        duration.saturating_add(timing.buffer_minutes),
                    ),
                    closes_inclusive: false,
                }
            }
            JoinPolicy::Listing {
                lead_minutes,
                default_duration,
            } => {
                let duration = duration_minutes.map_or(default_duration, i64::from);
                JoinWindow {
                    opens: offset_minutes(scheduled_at, lead_minutes.saturating_neg()),
                    closes: offset_minutes(scheduled_at, duration),
                    closes_inclusive: true,
                }
            }
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.opens && !self.has_closed(now)
    }

    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        if self.closes_inclusive {
            now > self.closes
        } else {
            now >= self.closes
        }
    }
}
