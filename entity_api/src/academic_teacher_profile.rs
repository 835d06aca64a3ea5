use super::error::Error;
use entity::{academic_teacher_profiles::{Column, Entity, Model}, Id};
use sea_orm::entity::prelude::*;
use std::collections::HashMap;

/// Batch load teacher profiles by IDs
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
        .map(|p| (p.id, p))
        .collect())
}
