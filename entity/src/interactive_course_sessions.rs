//! SeaORM Entity for interactive_course_sessions. The academy is reached through the course.

use crate::session_status::SessionStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::interactive_course_sessions::Model)]
#[sea_orm(schema_name = "academy", table_name = "interactive_course_sessions")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub course_id: Id,
    pub session_number: i32,
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
        belongs_to = "super::interactive_courses::Entity",
        from = "Column::CourseId",
        to = "super::interactive_courses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    InteractiveCourses,
}

impl Related<super::interactive_courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InteractiveCourses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
