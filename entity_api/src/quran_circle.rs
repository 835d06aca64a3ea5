use super::error::Error;
use entity::{quran_circles, quran_individual_circles, Id};
use sea_orm::entity::prelude::*;

pub async fn find_group_circle(
    db: &impl ConnectionTrait,
    id: Id,
) -> Result<Option<quran_circles::Model>, Error> {
    Ok(quran_circles::Entity::find_by_id(id).one(db).await?)
}

pub async fn find_individual_circle(
    db: &impl ConnectionTrait,
    id: Id,
) -> Result<Option<quran_individual_circles::Model>, Error> {
    Ok(quran_individual_circles::Entity::find_by_id(id).one(db).await?)
}
