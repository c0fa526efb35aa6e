//! Project API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::models::{ActivityEntry, CreateProjectRequest, Project, ProjectView};
use crate::portal::projects;
use crate::AppState;

/// POST /api/projects - Create a project and its portal.
pub async fn create_project(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Project> {
    created(projects::create(&state, &caller, &request).await?)
}

/// GET /api/projects - List projects visible to the caller.
pub async fn list_projects(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Vec<ProjectView>> {
    success(projects::list(&state, &caller).await?)
}

/// GET /api/projects/{projectId} - Get a single project.
pub async fn get_project(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<ProjectView> {
    success(projects::get(&state, &caller, &project_id).await?)
}

/// DELETE /api/projects/{projectId} - Delete a project.
pub async fn delete_project(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<()> {
    projects::delete(&state, &caller, &project_id).await?;
    success(())
}

/// GET /api/projects/{projectId}/activity - Project activity log.
pub async fn list_activity(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<String>,
) -> ApiResult<Vec<ActivityEntry>> {
    success(projects::list_activity(&state, &caller, &project_id).await?)
}
