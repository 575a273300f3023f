use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{DbErr, RuntimeErr};
use tracing::warn;
use uuid::Uuid;

use super::{IdentityStore, MetadataStore};
use crate::entity::{trace, user};

/// Run a store call under `limit`. An elapsed deadline is reported as a
/// connection error so it classifies as transient.
async fn bounded<T>(
    limit: Duration,
    op: &'static str,
    call: impl Future<Output = Result<T, DbErr>>,
) -> Result<T, DbErr> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(op, timeout = ?limit, "Store call timed out");
            Err(DbErr::Conn(RuntimeErr::Internal(format!(
                "{op} timed out after {limit:?}"
            ))))
        }
    }
}

/// [`MetadataStore`] whose every call is bounded by a deadline.
pub struct DeadlineMetadataStore {
    inner: Arc<dyn MetadataStore>,
    limit: Duration,
}

impl DeadlineMetadataStore {
    pub fn new(inner: Arc<dyn MetadataStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl MetadataStore for DeadlineMetadataStore {
    async fn insert_trace(&self, trace: trace::Model) -> Result<trace::Model, DbErr> {
        bounded(self.limit, "insert_trace", self.inner.insert_trace(trace)).await
    }

    async fn find_trace(&self, id: Uuid) -> Result<Option<trace::Model>, DbErr> {
        bounded(self.limit, "find_trace", self.inner.find_trace(id)).await
    }

    async fn list_traces(&self) -> Result<Vec<trace::Model>, DbErr> {
        bounded(self.limit, "list_traces", self.inner.list_traces()).await
    }

    async fn list_traces_by_course(&self, course_id: &str) -> Result<Vec<trace::Model>, DbErr> {
        bounded(
            self.limit,
            "list_traces_by_course",
            self.inner.list_traces_by_course(course_id),
        )
        .await
    }

    async fn delete_trace(&self, id: Uuid) -> Result<bool, DbErr> {
        bounded(self.limit, "delete_trace", self.inner.delete_trace(id)).await
    }

    async fn trace_locations(&self) -> Result<Vec<String>, DbErr> {
        bounded(self.limit, "trace_locations", self.inner.trace_locations()).await
    }

    async fn course_exists(&self, course_id: &str) -> Result<bool, DbErr> {
        bounded(self.limit, "course_exists", self.inner.course_exists(course_id)).await
    }

    async fn instructor_exists(&self, instructor_id: &str) -> Result<bool, DbErr> {
        bounded(
            self.limit,
            "instructor_exists",
            self.inner.instructor_exists(instructor_id),
        )
        .await
    }

    async fn semester_term_exists(&self, term: &str) -> Result<bool, DbErr> {
        bounded(
            self.limit,
            "semester_term_exists",
            self.inner.semester_term_exists(term),
        )
        .await
    }

    async fn ping(&self) -> Result<(), DbErr> {
        bounded(self.limit, "ping", self.inner.ping()).await
    }
}

/// [`IdentityStore`] whose every call is bounded by a deadline.
pub struct DeadlineIdentityStore {
    inner: Arc<dyn IdentityStore>,
    limit: Duration,
}

impl DeadlineIdentityStore {
    pub fn new(inner: Arc<dyn IdentityStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl IdentityStore for DeadlineIdentityStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<user::Model>, DbErr> {
        bounded(
            self.limit,
            "find_user_by_username",
            self.inner.find_user_by_username(username),
        )
        .await
    }

    async fn find_user(&self, id: &str) -> Result<Option<user::Model>, DbErr> {
        bounded(self.limit, "find_user", self.inner.find_user(id)).await
    }

    async fn insert_user(&self, user: user::Model) -> Result<user::Model, DbErr> {
        bounded(self.limit, "insert_user", self.inner.insert_user(user)).await
    }

    async fn update_user(&self, user: user::Model) -> Result<user::Model, DbErr> {
        bounded(self.limit, "update_user", self.inner.update_user(user)).await
    }
}
