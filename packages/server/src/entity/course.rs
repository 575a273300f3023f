use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub code: String,
    pub name: String,

    #[sea_orm(indexed)]
    pub instructor_id: String,

    pub date_added: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
