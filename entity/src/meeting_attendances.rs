//! SeaORM Entity for meeting_attendances: one row per (session, user) tracking the
//! join/leave cycles observed in the meeting room.

use crate::attendance_status::AttendanceStatus;
use crate::session_kind::SessionKind;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::meeting_attendances::Model)]
#[sea_orm(schema_name = "academy", table_name = "meeting_attendances")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub session_kind: SessionKind,
    pub session_id: Id,
    pub user_id: Id,
    pub attendance_status: Option<AttendanceStatus>,
    pub join_count: i32,
    pub total_duration_minutes: i32,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub first_join_time: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_join_time: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_leave_time: Option<DateTimeWithTimeZone>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
