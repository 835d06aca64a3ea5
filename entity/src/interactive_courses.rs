//! SeaORM Entity for interactive_courses. A course owns a numbered series of sessions
//! and can override the preparation and buffer minutes for all of them.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::interactive_courses::Model)]
#[sea_orm(schema_name = "academy", table_name = "interactive_courses")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub academy_id: Id,
    pub title: String,
    /// References academic_teacher_profiles.id
    pub assigned_teacher_id: Option<Id>,
    pub total_sessions: Option<i32>,
    pub preparation_minutes: Option<i32>,
    pub buffer_minutes: Option<i32>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::interactive_course_sessions::Entity")]
    InteractiveCourseSessions,
    #[sea_orm(has_many = "super::course_enrollments::Entity")]
    CourseEnrollments,
}

impl Related<super::interactive_course_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InteractiveCourseSessions.def()
    }
}

impl Related<super::course_enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseEnrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
