//! Project lifecycle. Each project is created together with its portal.

use tracing::info;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{ActivityEntry, CreateProjectRequest, Project, ProjectView};
use crate::portal::access::{authorize_project, require_project_owner};
use crate::AppState;

const MAX_NAME_LEN: usize = 200;

pub async fn create(
    state: &AppState,
    caller: &Caller,
    request: &CreateProjectRequest,
) -> Result<Project, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Project name cannot be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Project name cannot be longer than {} characters",
            MAX_NAME_LEN
        )));
    }

    let request = CreateProjectRequest {
        name: name.to_string(),
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    };

    let project = state
        .repo
        .create_project(
            &caller.id,
            &caller.email,
            caller.subscribed,
            &state.config.quota,
            &request,
        )
        .await?;

    info!(project_id = %project.id, portal_id = %project.portal_id, "Project created");
    Ok(project)
}

/// Projects the caller owns or is an active member of, newest first.
pub async fn list(state: &AppState, caller: &Caller) -> Result<Vec<ProjectView>, AppError> {
    state.repo.list_projects_for(&caller.id, &caller.email).await
}

pub async fn get(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
) -> Result<ProjectView, AppError> {
    let (project, access) = authorize_project(&state.repo, caller, project_id).await?;
    Ok(ProjectView {
        project,
        role: access.role,
    })
}

/// Delete a project with its portal, memberships, documents and history.
pub async fn delete(state: &AppState, caller: &Caller, project_id: &str) -> Result<(), AppError> {
    let project = require_project_owner(&state.repo, caller, project_id).await?;
    state.repo.delete_project(&project.id).await?;

    info!(project_id = %project.id, "Project deleted");
    Ok(())
}

pub async fn list_activity(
    state: &AppState,
    caller: &Caller,
    project_id: &str,
) -> Result<Vec<ActivityEntry>, AppError> {
    let (project, _) = authorize_project(&state.repo, caller, project_id).await?;
    state.repo.list_activity(&project.id).await
}
