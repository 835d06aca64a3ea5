use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status shared by every session kind.
///
/// Sessions move forward only: `Unscheduled`/`Scheduled`/`Absent` become `Ready` or
/// `Ongoing`, which in turn become `Completed`. `Cancelled` can be reached from any
/// state that is not terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "session_status")]
pub enum SessionStatus {
    #[sea_orm(string_value = "unscheduled")]
    Unscheduled,
    #[sea_orm(string_value = "scheduled")]
    #[default]
    Scheduled,
    #[sea_orm(string_value = "ready")]
    Ready,
    #[sea_orm(string_value = "ongoing")]
    Ongoing,
    #[sea_orm(string_value = "absent")]
    Absent,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl SessionStatus {
    /// `Ready` and `Ongoing` sessions have an open meeting room.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionStatus::Ready | SessionStatus::Ongoing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Unscheduled => "unscheduled",
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Ready => "ready",
            SessionStatus::Ongoing => "ongoing",
            SessionStatus::Absent => "absent",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "unscheduled" => Ok(SessionStatus::Unscheduled),
            "scheduled" => Ok(SessionStatus::Scheduled),
            "ready" => Ok(SessionStatus::Ready),
            "ongoing" => Ok(SessionStatus::Ongoing),
            "absent" => Ok(SessionStatus::Absent),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}
