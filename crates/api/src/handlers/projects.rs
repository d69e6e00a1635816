//! Handlers for the `/projects` gallery. Every route is owner-only; other
//! users' projects read as missing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use storysplice_core::gallery::{page_window, total_pages, DEFAULT_PER_PAGE};
use storysplice_core::project::validate_project_name;
use storysplice_core::types::DbId;
use storysplice_db::models::project::{Project, UpdateProject};
use storysplice_pipeline::PipelineError;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PageParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// One gallery page, newest project first.
#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub items: Vec<Project>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// GET /api/v1/projects?page=N
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<DataResponse<ProjectPage>>> {
    let store = state.orchestrator.projects();
    let page = params.page();
    let per_page = DEFAULT_PER_PAGE;

    let total = store
        .count_by_owner(auth.user_id)
        .await
        .map_err(PipelineError::from)?
        .max(0) as usize;
    // Bounds are clamped to `total`, which came out of an i64 count.
    let (start, end) = page_window(total, page, per_page);
    let items = if start == end {
        Vec::new()
    } else {
        let limit = i64::try_from(end - start).unwrap_or(i64::MAX);
        let offset = i64::try_from(start).unwrap_or(i64::MAX);
        store
            .list_by_owner(auth.user_id, limit, offset)
            .await
            .map_err(PipelineError::from)?
    };

    Ok(Json(DataResponse {
        data: ProjectPage {
            items,
            page,
            per_page,
            total,
            total_pages: total_pages(total, per_page),
        },
    }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = owned_project(&state, auth.user_id, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
///
/// Rename or correct the duration label. Blobs are never rewritten.
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    owned_project(&state, auth.user_id, id).await?;

    let name = match &input.name {
        Some(name) => Some(validate_project_name(name)?.to_string()),
        None => None,
    };
    let update = UpdateProject {
        name,
        duration: input.duration.map(|d| d.trim().to_string()),
    };

    let project = state
        .orchestrator
        .projects()
        .update(id, &update)
        .await
        .map_err(PipelineError::from)?
        .ok_or_else(not_found)?;
    tracing::info!(project_id = id, owner_id = auth.user_id, "Project updated");
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the stored video and thumbnail, then the record.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.orchestrator.delete_project(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_project(state: &AppState, owner_id: DbId, id: DbId) -> AppResult<Project> {
    let project = state
        .orchestrator
        .projects()
        .find(id)
        .await
        .map_err(PipelineError::from)?
        .filter(|p| p.owner_id == owner_id)
        .ok_or_else(not_found)?;
    Ok(project)
}

fn not_found() -> PipelineError {
    PipelineError::NotFound("Project not found.".into())
}
