//! PostgreSQL-backed [`ProjectStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use storysplice_core::types::DbId;
use storysplice_db::models::project::{CreateProject, Project, UpdateProject};
use storysplice_db::repositories::ProjectRepo;

use crate::ports::{ProjectStore, StoreError};

/// SQLSTATE `insufficient_privilege`.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create(&self, input: &CreateProject) -> Result<Project, StoreError> {
        ProjectRepo::create(&self.pool, input).await.map_err(classify)
    }

    async fn find(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        ProjectRepo::find_by_id(&self.pool, id).await.map_err(classify)
    }

    async fn list_by_owner(
        &self,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Project>, StoreError> {
        ProjectRepo::list_by_owner(&self.pool, owner_id, limit, offset).await.map_err(classify)
    }

    async fn count_by_owner(&self, owner_id: DbId) -> Result<i64, StoreError> {
        ProjectRepo::count_by_owner(&self.pool, owner_id).await.map_err(classify)
    }

    async fn update(
        &self,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, StoreError> {
        ProjectRepo::update(&self.pool, id, input).await.map_err(classify)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        ProjectRepo::delete(&self.pool, id).await.map_err(classify)
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE) => {
            StoreError::PermissionDenied(db.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}
