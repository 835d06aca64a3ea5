use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a Quran session belongs to a one-on-one circle or a group circle.
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
#[serde(rename_all = "lowercase")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "quran_session_type"
)]
pub enum QuranSessionType {
    #[sea_orm(string_value = "individual")]
    #[default]
    Individual,
    #[sea_orm(string_value = "group")]
    Group,
}
