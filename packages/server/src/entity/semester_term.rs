use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Academic term such as `2024B`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "semester_term")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub term: String,

    pub name: String,
}

impl ActiveModelBehavior for ActiveModel {}
