mod deadline;
mod identity;
mod metadata;

use async_trait::async_trait;
use sea_orm::DbErr;
use uuid::Uuid;

use crate::entity::{trace, user};

pub use deadline::{DeadlineIdentityStore, DeadlineMetadataStore};
pub use identity::SeaOrmIdentityStore;
pub use metadata::SeaOrmMetadataStore;

/// Relational persistence of traces and read-only checks on their references.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert_trace(&self, trace: trace::Model) -> Result<trace::Model, DbErr>;

    async fn find_trace(&self, id: Uuid) -> Result<Option<trace::Model>, DbErr>;

    /// Every trace, oldest first.
    async fn list_traces(&self) -> Result<Vec<trace::Model>, DbErr>;

    async fn list_traces_by_course(&self, course_id: &str) -> Result<Vec<trace::Model>, DbErr>;

    /// Returns `false` when no row was removed.
    async fn delete_trace(&self, id: Uuid) -> Result<bool, DbErr>;

    /// Stored object locations of all traces.
    async fn trace_locations(&self) -> Result<Vec<String>, DbErr>;

    async fn course_exists(&self, course_id: &str) -> Result<bool, DbErr>;

    async fn instructor_exists(&self, instructor_id: &str) -> Result<bool, DbErr>;

    async fn semester_term_exists(&self, term: &str) -> Result<bool, DbErr>;

    async fn ping(&self) -> Result<(), DbErr>;
}

/// Lookup and maintenance of user accounts.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr>;

    async fn find_user(&self, id: &str) -> Result<Option<user::Model>, DbErr>;

    async fn insert_user(&self, user: user::Model) -> Result<user::Model, DbErr>;

    /// Overwrite the mutable columns of an existing user.
    async fn update_user(&self, user: user::Model) -> Result<user::Model, DbErr>;
}
