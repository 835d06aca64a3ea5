use crate::{roles::Role, Id};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::users::Model)]
#[sea_orm(schema_name = "academy", table_name = "users")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    /// Platform-wide super admins are not bound to an academy
    pub academy_id: Option<Id>,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Storage-relative path of the avatar image
    pub avatar: Option<String>,
    pub role: Role,
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
        belongs_to = "super::academies::Entity",
        from = "Column::AcademyId",
        to = "super::academies::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Academies,
}

impl Related<super::academies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Academies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
