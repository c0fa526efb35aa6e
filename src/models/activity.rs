//! Append-only project activity log.

use serde::{Deserialize, Serialize};

/// One recorded action on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    pub project_id: String,
    pub actor_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: String,
}

pub mod actions {
    pub const PROJECT_CREATED: &str = "project.created";
    pub const MEMBER_INVITED: &str = "member.invited";
    pub const MEMBER_ADDED: &str = "member.added";
    pub const INVITE_RESENT: &str = "member.invite_resent";
    pub const INVITE_ACCEPTED: &str = "member.invite_accepted";
    pub const MEMBER_REMOVED: &str = "member.removed";
    pub const DOCUMENT_CREATED: &str = "document.created";
    pub const DOCUMENT_DELETED: &str = "document.deleted";
    pub const VERSION_ADDED: &str = "document.version_added";
}
