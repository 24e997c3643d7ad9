use async_trait::async_trait;
use repocrate::{
    AllowedWith, Relation as ResourceRelation, RepositoryError, Resource, SortOrder,
    relation_values,
};
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, LoaderTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::comment;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_one = "super::post_meta::Entity")]
    PostMeta,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::post_meta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostMeta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[async_trait]
impl Resource for Entity {
    const MORPH_CLASS: &'static str = "post";

    fn relation(name: &str) -> Option<ResourceRelation> {
        match name {
            "user" => Some(ResourceRelation::from_def::<super::user::Entity>(
                &Relation::User.def(),
            )),
            "post_meta" => Some(ResourceRelation::from_def::<super::post_meta::Entity>(
                &Relation::PostMeta.def(),
            )),
            "comments" => Some(ResourceRelation::morph_many::<comment::Entity>("commentable")),
            _ => None,
        }
    }

    async fn load_relation(
        db: &DatabaseConnection,
        name: &str,
        models: &[Model],
    ) -> Result<Vec<Value>, RepositoryError> {
        match name {
            "user" => relation_values(models.load_one(super::user::Entity, db).await?),
            "post_meta" => relation_values(models.load_one(super::post_meta::Entity, db).await?),
            "comments" => {
                let ids: Vec<i32> = models.iter().map(|post| post.id).collect();
                let comments = comment::Entity::find()
                    .filter(comment::Column::CommentableType.eq(Self::MORPH_CLASS))
                    .filter(comment::Column::CommentableId.is_in(ids))
                    .order_by_asc(comment::Column::Id)
                    .all(db)
                    .await?;
                let grouped: Vec<Vec<comment::Model>> = models
                    .iter()
                    .map(|post| {
                        comments
                            .iter()
                            .filter(|comment| comment.commentable_id == post.id)
                            .cloned()
                            .collect()
                    })
                    .collect();
                relation_values(grouped)
            }
            _ => Err(RepositoryError::unknown_relation("posts", name)),
        }
    }

    fn default_sort() -> Option<(&'static str, SortOrder)> {
        Some(("id", SortOrder::Asc))
    }

    fn allowed_with() -> AllowedWith {
        AllowedWith::All
    }
}
