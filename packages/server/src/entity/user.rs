use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub first_name: String,
    pub last_name: String,

    /// E-mail address used as the login identifier.
    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 PHC string.
    pub password: String,

    pub account_created: DateTimeUtc,
    pub account_updated: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
