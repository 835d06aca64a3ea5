use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::course_enrollments::Model)]
#[sea_orm(schema_name = "academy", table_name = "course_enrollments")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub course_id: Id,
    pub student_id: Id,
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
