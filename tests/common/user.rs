use async_trait::async_trait;
use repocrate::{
    AllowedWith, ListColumn, Relation as ResourceRelation, RepositoryError, Resource,
    relation_values,
};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, LoaderTrait};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub country_id: Option<i32>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(
        belongs_to = "super::country::Entity",
        from = "Column::CountryId",
        to = "super::country::Column::Id"
    )]
    Country,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::country::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Country.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[async_trait]
impl Resource for Entity {
    const MORPH_CLASS: &'static str = "user";

    fn relation(name: &str) -> Option<ResourceRelation> {
        match name {
            "posts" => Some(ResourceRelation::from_def::<super::post::Entity>(
                &Relation::Posts.def(),
            )),
            "comments" => Some(ResourceRelation::from_def::<super::comment::Entity>(
                &Relation::Comments.def(),
            )),
            "country" => Some(ResourceRelation::from_def::<super::country::Entity>(
                &Relation::Country.def(),
            )),
            _ => None,
        }
    }

    async fn load_relation(
        db: &DatabaseConnection,
        name: &str,
        models: &[Model],
    ) -> Result<Vec<Value>, RepositoryError> {
        match name {
            "posts" => relation_values(models.load_many(super::post::Entity, db).await?),
            "comments" => relation_values(models.load_many(super::comment::Entity, db).await?),
            "country" => relation_values(models.load_one(super::country::Entity, db).await?),
            _ => Err(RepositoryError::unknown_relation("users", name)),
        }
    }

    fn allowed_with() -> AllowedWith {
        AllowedWith::only(["posts", "comments", "country"])
    }

    fn default_list_column() -> Option<ListColumn<Model>> {
        Some(ListColumn::mapper(Model::full_name))
    }
}
