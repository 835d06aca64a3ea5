use super::error::Error;
use entity::{academies::{Entity, Model}, Id};
use sea_orm::entity::prelude::*;

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Option<Model>, Error> {
    Ok(Entity::find_by_id(id).one(db).await?)
}
