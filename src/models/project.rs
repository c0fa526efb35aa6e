//! Project and portal models.

use serde::{Deserialize, Serialize};

use super::MemberRole;

/// An owner's project. Every project is backed by exactly one portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub portal_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// The client-facing workspace of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: String,
}

/// A project as seen by a particular caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub role: MemberRole,
}

/// Request body for creating a new project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
