use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set,
};

use super::IdentityStore;
use crate::entity::user;

#[derive(Clone)]
pub struct SeaOrmIdentityStore {
    db: DatabaseConnection,
}

impl SeaOrmIdentityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for SeaOrmIdentityStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    async fn find_user(&self, id: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find_by_id(id.to_string()).one(&self.db).await
    }

    async fn insert_user(&self, model: user::Model) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(model.id),
            first_name: Set(model.first_name),
            last_name: Set(model.last_name),
            username: Set(model.username),
            password: Set(model.password),
            account_created: Set(model.account_created),
            account_updated: Set(model.account_updated),
        }
        .insert(&self.db)
        .await
    }

    async fn update_user(&self, model: user::Model) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Unchanged(model.id),
            first_name: Set(model.first_name),
            last_name: Set(model.last_name),
            username: Unchanged(model.username),
            password: Set(model.password),
            account_created: Unchanged(model.account_created),
            account_updated: Set(model.account_updated),
        }
        .update(&self.db)
        .await
    }
}
