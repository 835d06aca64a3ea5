use crate::attendance_status::AttendanceStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::interactive_session_reports::Model)]
#[sea_orm(schema_name = "academy", table_name = "interactive_session_reports")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    pub session_id: Id,
    pub student_id: Id,
    pub attendance_status: Option<AttendanceStatus>,
    pub actual_attendance_minutes: Option<i32>,
    pub attendance_percentage: Option<f64>,
    pub is_late: Option<bool>,
    pub late_minutes: Option<i32>,
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
