use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded course artifact.
///
/// References to course, instructor, semester term and uploader are checked
/// by the submission pipeline rather than by foreign keys, so each failure
/// keeps its own client-facing category.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trace")]
pub struct Model {
    /// UUIDv4 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// Original upload filename.
    pub file_name: String,

    /// Object location, `s3://{bucket}/{path}`.
    #[sea_orm(unique)]
    pub bucket_path: String,

    #[sea_orm(indexed)]
    pub course_id: String,

    pub instructor_id: String,
    pub semester_term: String,
    pub section: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
