use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "role")]
pub enum Role {
    #[sea_orm(string_value = "student")]
    #[default]
    Student,
    #[sea_orm(string_value = "quran_teacher")]
    QuranTeacher,
    #[sea_orm(string_value = "academic_teacher")]
    AcademicTeacher,
    #[sea_orm(string_value = "parent")]
    Parent,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

impl Role {
    /// Teachers may enter a session during its preparation window.
    pub fn is_teacher(&self) -> bool {
        matches!(self, Role::QuranTeacher | Role::AcademicTeacher)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(fmt, "student"),
            Role::QuranTeacher => write!(fmt, "quran_teacher"),
            Role::AcademicTeacher => write!(fmt, "academic_teacher"),
            Role::Parent => write!(fmt, "parent"),
            Role::Admin => write!(fmt, "admin"),
            Role::SuperAdmin => write!(fmt, "super_admin"),
        }
    }
}
