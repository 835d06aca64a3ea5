use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A group Quran circle. Its timing overrides apply to every session of the circle.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::quran_circles::Model)]
#[sea_orm(schema_name = "academy", table_name = "quran_circles")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub academy_id: Id,
    pub name: Option<String>,
    /// Minutes before `scheduled_at` that the teacher may open the room
    pub preparation_minutes: Option<i32>,
    /// Grace minutes after the nominal end before a session expires
    pub ending_buffer_minutes: Option<i32>,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
