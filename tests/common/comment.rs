use repocrate::{Relation as ResourceRelation, Resource};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Polymorphic: `commentable_type` holds the owner's morph class.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub commentable_id: i32,
    pub commentable_type: String,
    pub body: String,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const MORPH_CLASS: &'static str = "comment";

    fn relation(name: &str) -> Option<ResourceRelation> {
        match name {
            "user" => Some(ResourceRelation::from_def::<super::user::Entity>(
                &Relation::User.def(),
            )),
            _ => None,
        }
    }
}
