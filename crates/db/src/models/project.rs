//! Saved project model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storysplice_core::types::{DbId, Timestamp};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    /// Formatted as `m:ss`.
    pub duration: String,
    pub video_url: String,
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub owner_id: DbId,
    pub name: String,
    pub duration: String,
    pub video_url: String,
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub duration: Option<String>,
}
