use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::MetadataStore;
use crate::entity::{course, instructor, semester_term, trace};

#[derive(Clone)]
pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn insert_trace(&self, model: trace::Model) -> Result<trace::Model, DbErr> {
        trace::ActiveModel {
            id: Set(model.id),
            user_id: Set(model.user_id),
            file_name: Set(model.file_name),
            bucket_path: Set(model.bucket_path),
            course_id: Set(model.course_id),
            instructor_id: Set(model.instructor_id),
            semester_term: Set(model.semester_term),
            section: Set(model.section),
            created_at: Set(model.created_at),
        }
        .insert(&self.db)
        .await
    }

    async fn find_trace(&self, id: Uuid) -> Result<Option<trace::Model>, DbErr> {
        trace::Entity::find_by_id(id).one(&self.db).await
    }

    async fn list_traces(&self) -> Result<Vec<trace::Model>, DbErr> {
        trace::Entity::find()
            .order_by_asc(trace::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn list_traces_by_course(&self, course_id: &str) -> Result<Vec<trace::Model>, DbErr> {
        trace::Entity::find()
            .filter(trace::Column::CourseId.eq(course_id))
            .order_by_asc(trace::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn delete_trace(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = trace::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn trace_locations(&self) -> Result<Vec<String>, DbErr> {
        trace::Entity::find()
            .select_only()
            .column(trace::Column::BucketPath)
            .into_tuple::<String>()
            .all(&self.db)
            .await
    }

    async fn course_exists(&self, course_id: &str) -> Result<bool, DbErr> {
        Ok(course::Entity::find_by_id(course_id.to_string())
            .one(&self.db)
            .await?
            .is_some())
    }

    async fn instructor_exists(&self, instructor_id: &str) -> Result<bool, DbErr> {
        Ok(instructor::Entity::find_by_id(instructor_id.to_string())
            .one(&self.db)
            .await?
            .is_some())
    }

    async fn semester_term_exists(&self, term: &str) -> Result<bool, DbErr> {
        Ok(semester_term::Entity::find_by_id(term.to_string())
            .one(&self.db)
            .await?
            .is_some())
    }

    async fn ping(&self) -> Result<(), DbErr> {
        self.db.ping().await
    }
}
