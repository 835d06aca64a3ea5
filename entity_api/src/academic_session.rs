use super::error::Error;
use crate::query::SessionFilters;
use chrono::{DateTime, Utc};
use entity::{
    academic_sessions::{ActiveModel, Column, Entity, Model},
    session_status::SessionStatus,
    Id,
};
use log::debug;
use sea_orm::{entity::prelude::*, sea_query::Expr, QuerySelect, Set};

pub async fn find_in_academy(
    db: &impl ConnectionTrait,
    id: Id,
    academy_id: Option<Id>,
) -> Result<Option<Model>, Error> {
    let mut query = Entity::find_by_id(id);
    if let Some(academy_id) = academy_id {
        query = query.filter(Column::AcademyId.eq(academy_id));
    }
    Ok(query.one(db).await?)
}

pub async fn find_by_id_for_update(
    txn: &impl ConnectionTrait,
    id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).lock_exclusive().one(txn).await?)
}

pub async fn complete(
    db: &impl ConnectionTrait,
    session: Model,
    ended_at: DateTime<Utc>,
    actual_duration_minutes: i32,
) -> Result<Model, Error> {
    debug!("Completing academic session {}", session.id);

    let mut active_model: ActiveModel = session.into();
    active_model.status = Set(SessionStatus::Completed);
    active_model.ended_at = Set(Some(ended_at.into()));
    active_model.actual_duration_minutes = Set(Some(actual_duration_minutes));
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn find_for_student(
    db: &impl ConnectionTrait,
    student_id: Id,
    filters: &SessionFilters,
) -> Result<Vec<Model>, Error> {
    let query = Entity::find().filter(Column::StudentId.eq(student_id));
    Ok(filters
        .apply(query, Column::Status, Column::ScheduledAt)
        .all(db)
        .await?)
}

pub async fn find_by_id_for_student(
    db: &impl ConnectionTrait,
    id: Id,
    student_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id)
        .filter(Column::StudentId.eq(student_id))
        .one(db)
        .await?)
}

pub async fn record_feedback(
    db: &impl ConnectionTrait,
    id: Id,
    rating: i32,
    feedback: Option<String>,
) -> Result<bool, Error> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let result = Entity::update_many()
        .col_expr(Column::StudentRating, Expr::value(rating))
        .col_expr(Column::StudentFeedback, Expr::value(feedback))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(SessionStatus::Completed))
        .filter(Column::StudentRating.is_null())
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

pub async fn find_live_scheduled_before(
    db: &impl ConnectionTrait,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Status.is_in([SessionStatus::Ready, SessionStatus::Ongoing]))
        .filter(Column::ScheduledAt.lte(cutoff))
        .all(db)
        .await?)
}
