//! Portal membership model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role a principal holds within a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    #[default]
    Client,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Client => "client",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "client" => Some(MemberRole::Client),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// Invitation state of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Invited,
    Active,
    Removed,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Invited => "invited",
            MemberStatus::Active => "active",
            MemberStatus::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invited" => Some(MemberStatus::Invited),
            "active" => Some(MemberStatus::Active),
            "removed" => Some(MemberStatus::Removed),
            _ => None,
        }
    }
}

/// One principal's relationship to a portal.
///
/// `(portal_id, email)` is unique. An `active` row always has `user_id`; an
/// `invited` row has an `invite_token` and no `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalMember {
    pub id: String,
    pub portal_id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub invited_by: String,
    /// Bearer credential; only ever delivered through the notification sink
    #[serde(skip_serializing, default)]
    pub invite_token: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Membership row with the email resolved from the linked account when present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub member: PortalMember,
    pub display_email: String,
}

/// The caller's own relationship to a portal.
///
/// For the portal owner without a backing row this is synthesized and `id` is absent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyMembership {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub portal_id: String,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub email: String,
}

impl MyMembership {
    pub fn synthesized_owner(portal_id: &str, email: &str) -> Self {
        Self {
            id: None,
            portal_id: portal_id.to_string(),
            role: MemberRole::Owner,
            status: MemberStatus::Active,
            email: email.to_string(),
        }
    }
}

impl From<PortalMember> for MyMembership {
    fn from(member: PortalMember) -> Self {
        Self {
            id: Some(member.id),
            portal_id: member.portal_id,
            role: member.role,
            status: member.status,
            email: member.email,
        }
    }
}

/// Request body for inviting an email to a portal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub role: Option<MemberRole>,
}

/// Request body for resending a pending invitation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResendInviteRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Result of the login/signup sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSync {
    pub user_id: String,
    pub activated: u64,
}
