use repocrate::{Relation as ResourceRelation, Resource};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Resource for Entity {
    const MORPH_CLASS: &'static str = "country";

    fn relation(name: &str) -> Option<ResourceRelation> {
        match name {
            "users" => Some(ResourceRelation::from_def::<super::user::Entity>(
                &Relation::Users.def(),
            )),
            // Posts are reached through users; the engines cannot join that.
            "posts" => Some(ResourceRelation::unsupported::<super::post::Entity>(
                "HasManyThrough",
            )),
            _ => None,
        }
    }
}
