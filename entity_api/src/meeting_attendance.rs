use super::error::Error;
use entity::{
    meeting_attendances::{Column, Entity, Model},
    session_kind::SessionKind,
    Id,
};
use sea_orm::entity::prelude::*;

/// The attendance row of `user_id` for a session. Its existence alone means the user
/// has joined the meeting at least once.
pub async fn find_for_user(
    db: &impl ConnectionTrait,
    kind: SessionKind,
    session_id: Id,
    user_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::SessionKind.eq(kind))
        .filter(Column::SessionId.eq(session_id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::test_support::logged_sql;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn find_for_user_keys_on_kind_session_and_user() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![Vec::<Model>::new()])
            .into_connection();

        let found = find_for_user(&db, SessionKind::Academic, 7, 42).await?;

        assert!(found.is_none());
        let sql = logged_sql(db);
        assert!(sql[0].contains(r#""meeting_attendances"."session_id" = $2"#));
        assert!(sql[0].contains(r#""meeting_attendances"."user_id" = $3"#));

        Ok(())
    }
}
