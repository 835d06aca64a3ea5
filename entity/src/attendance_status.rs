use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Scored attendance outcome stored on attendance rows and session reports.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, Deserialize, Serialize, DeriveActiveEnum, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "attendance_status"
)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "attended")]
    Attended,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "left")]
    Left,
    #[sea_orm(string_value = "absent")]
    Absent,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Attended => write!(fmt, "attended"),
            AttendanceStatus::Partial => write!(fmt, "partial"),
            AttendanceStatus::Left => write!(fmt, "left"),
            AttendanceStatus::Absent => write!(fmt, "absent"),
        }
    }
}
