//! Post-session reports. Each session kind keeps its reports in its own table; callers
//! get a single [`SessionReport`] shape back regardless of the kind.

use super::error::Error;
use entity::{
    academic_session_reports, attendance_status::AttendanceStatus, interactive_session_reports,
    session_kind::SessionKind, student_session_reports, Id,
};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionReport {
    pub attendance_status: Option<AttendanceStatus>,
    pub actual_attendance_minutes: Option<i32>,
    pub attendance_percentage: Option<f64>,
    pub is_late: Option<bool>,
    pub late_minutes: Option<i32>,
    pub updated_at: DateTimeWithTimeZone,
}

macro_rules! impl_from_report {
    ($($module:ident),+) => {
        $(
            impl From<$module::Model> for SessionReport {
                fn from(report: $module::Model) -> Self {
                    Self {
                        attendance_status: report.attendance_status,
                        actual_attendance_minutes: report.actual_attendance_minutes,
                        attendance_percentage: report.attendance_percentage,
                        is_late: report.is_late,
                        late_minutes: report.late_minutes,
                        updated_at: report.updated_at,
                    }
                }
            }
        )+
    };
}

impl_from_report!(
    academic_session_reports,
    interactive_session_reports,
    student_session_reports
);

pub async fn find_for_student(
    db: &impl ConnectionTrait,
    kind: SessionKind,
    session_id: Id,
    student_id: Id,
) -> Result<Option<SessionReport>, Error> {
    let report = match kind {
        SessionKind::Quran => student_session_reports::Entity::find()
            .filter(student_session_reports::Column::SessionId.eq(session_id))
            .filter(student_session_reports::Column::StudentId.eq(student_id))
            .one(db)
            .await?
            .map(SessionReport::from),
        SessionKind::Academic => academic_session_reports::Entity::find()
            .filter(academic_session_reports::Column::SessionId.eq(session_id))
            .filter(academic_session_reports::Column::StudentId.eq(student_id))
            .one(db)
            .await?
            .map(SessionReport::from),
        SessionKind::Interactive => interactive_session_reports::Entity::find()
            .filter(interactive_session_reports::Column::SessionId.eq(session_id))
            .filter(interactive_session_reports::Column::StudentId.eq(student_id))
            .one(db)
            .await?
            .map(SessionReport::from),
    };

    Ok(report)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::test_support::logged_sql;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn quran_reports_come_from_the_student_report_table() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let report = student_session_reports::Model {
            id: 1,
            session_id: 7,
            student_id: 42,
            attendance_status: Some(AttendanceStatus::Partial),
            actual_attendance_minutes: Some(30),
            attendance_percentage: Some(50.0),
            is_late: Some(true),
            late_minutes: Some(10),
            created_at: now.into(),
            updated_at: now.into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![report]])
            .into_connection();

        let found = find_for_student(&db, SessionKind::Quran, 7, 42).await?;

        assert_eq!(
            found.map(|r| r.attendance_status),
            Some(Some(AttendanceStatus::Partial))
        );
        assert!(logged_sql(db)[0].contains(r#"FROM "academy"."student_session_reports""#));

        Ok(())
    }
}
