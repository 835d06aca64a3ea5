//! SeaORM Entity for the quran_sessions table.

use crate::quran_session_type::QuranSessionType;
use crate::session_status::SessionStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::quran_sessions::Model)]
#[sea_orm(schema_name = "academy", table_name = "quran_sessions")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub academy_id: Id,
    pub session_type: QuranSessionType,
    /// Set for group sessions
    pub circle_id: Option<Id>,
    /// Set for individual sessions
    pub individual_circle_id: Option<Id>,
    pub student_id: Option<Id>,
    pub quran_teacher_id: Option<Id>,
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
    pub teacher_notes: Option<String>,
    pub from_surah: Option<i32>,
    pub from_verse: Option<i32>,
    pub to_surah: Option<i32>,
    pub to_verse: Option<i32>,
    pub pages_count: Option<i32>,
    pub memorization_quality: Option<String>,
    pub tajweed_quality: Option<String>,
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
        belongs_to = "super::quran_circles::Entity",
        from = "Column::CircleId",
        to = "super::quran_circles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    QuranCircles,
    #[sea_orm(
        belongs_to = "super::quran_individual_circles::Entity",
        from = "Column::IndividualCircleId",
        to = "super::quran_individual_circles::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    QuranIndividualCircles,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::QuranTeacherId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    QuranTeachers,
}

impl Related<super::quran_circles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuranCircles.def()
    }
}

impl Related<super::quran_individual_circles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuranIndividualCircles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
