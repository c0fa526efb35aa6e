//! Access control evaluator.
//!
//! Stateless: callers re-check on every request because membership can change
//! between requests.

use crate::auth::Caller;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{MemberRole, Portal, Project};

/// A granted access decision.
#[derive(Debug, Clone)]
pub struct Access {
    pub role: MemberRole,
}

/// Decide whether `caller` may use the portal, and in which role.
///
/// The owner is always granted without needing a membership row. Anyone else
/// needs an `active` row matched by account or email.
pub async fn authorize(
    repo: &Repository,
    caller: &Caller,
    portal_id: &str,
) -> Result<Access, AppError> {
    let portal = repo
        .get_portal(portal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portal {} not found", portal_id)))?;

    if portal.owner_id == caller.id {
        return Ok(Access {
            role: MemberRole::Owner,
        });
    }

    match repo
        .find_membership_for(&portal.id, &caller.id, &caller.email, true)
        .await?
    {
        Some(member) => Ok(Access { role: member.role }),
        None => {
            tracing::debug!(portal_id = %portal_id, user_id = %caller.id, "Portal access denied");
            Err(AppError::Forbidden(
                "You do not have access to this portal".to_string(),
            ))
        }
    }
}

/// Authorize against the portal backing a project.
pub async fn authorize_project(
    repo: &Repository,
    caller: &Caller,
    project_id: &str,
) -> Result<(Project, Access), AppError> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    let access = authorize(repo, caller, &project.portal_id).await?;
    Ok((project, access))
}

/// Require that `caller` owns the portal.
pub async fn require_portal_owner(
    repo: &Repository,
    caller: &Caller,
    portal_id: &str,
) -> Result<Portal, AppError> {
    let portal = repo
        .get_portal(portal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portal {} not found", portal_id)))?;

    if portal.owner_id != caller.id {
        return Err(AppError::Forbidden(
            "Only the portal owner can manage members".to_string(),
        ));
    }
    Ok(portal)
}

/// Require that `caller` owns the project.
pub async fn require_project_owner(
    repo: &Repository,
    caller: &Caller,
    project_id: &str,
) -> Result<Project, AppError> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", project_id)))?;

    if project.owner_id != caller.id {
        return Err(AppError::Forbidden(
            "Only the project owner can do this".to_string(),
        ));
    }
    Ok(project)
}
