use super::error::Error;
use entity::{interactive_courses::{Column, Entity, Model}, Id};
use sea_orm::entity::prelude::*;
use std::collections::HashMap;

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Batch load courses by IDs
pub async fn batch_load(
    db: &impl ConnectionTrait,
    ids: &[Id],
) -> Result<HashMap<Id, Model>, Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect())
}
