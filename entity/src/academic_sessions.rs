//! SeaORM Entity for the academic_sessions table.
//! Academic sessions have no per-session timing overrides; they use the global defaults.

use crate::session_status::SessionStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::academic_sessions::Model)]
#[sea_orm(schema_name = "academy", table_name = "academic_sessions")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub academy_id: Id,
    pub academic_teacher_id: Option<Id>,
    pub academic_subscription_id: Option<Id>,
    pub student_id: Id,
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub scheduled_at: Option<DateTimeWithTimeZone>,
    pub duration_minutes: Option<i32>,
    pub status: SessionStatus,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub ended_at: Option<DateTimeWithTimeZone>,
    pub actual_duration_minutes: Option<i32>,
    pub meeting_room_name: Option<String>,
    pub student_rating: Option<i32>,
    pub student_feedback: Option<String>,
    pub notes: Option<String>,
    pub homework: Option<String>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub homework_due_date: Option<DateTimeWithTimeZone>,
    pub topics_covered: Option<String>,
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
        belongs_to = "super::academic_teacher_profiles::Entity",
        from = "Column::AcademicTeacherId",
        to = "super::academic_teacher_profiles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AcademicTeacherProfiles,
    #[sea_orm(
        belongs_to = "super::academic_subscriptions::Entity",
        from = "Column::AcademicSubscriptionId",
        to = "super::academic_subscriptions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AcademicSubscriptions,
}

impl Related<super::academic_teacher_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicTeacherProfiles.def()
    }
}

impl Related<super::academic_subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicSubscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
