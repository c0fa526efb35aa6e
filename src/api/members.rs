//! Portal membership API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{created, success, ApiResult};
use crate::auth::Caller;
use crate::models::{
    InviteRequest, MemberView, MyMembership, PortalMember, ResendInviteRequest, SessionSync,
};
use crate::portal::membership;
use crate::AppState;

/// POST /api/session/sync - Register the caller and activate pending invites.
pub async fn sync_session(State(state): State<AppState>, caller: Caller) -> ApiResult<SessionSync> {
    success(membership::activate_pending_invites(&state, &caller).await?)
}

/// GET /api/portals/{portalId}/members - List a portal's members.
pub async fn list_members(
    State(state): State<AppState>,
    caller: Caller,
    Path(portal_id): Path<String>,
) -> ApiResult<Vec<MemberView>> {
    success(membership::list_members(&state, &caller, &portal_id).await?)
}

/// POST /api/portals/{portalId}/members - Invite an email.
pub async fn invite_member(
    State(state): State<AppState>,
    caller: Caller,
    Path(portal_id): Path<String>,
    Json(request): Json<InviteRequest>,
) -> ApiResult<PortalMember> {
    created(membership::invite(&state, &caller, &portal_id, &request).await?)
}

/// POST /api/portals/{portalId}/members/resend - Resend a pending invitation.
pub async fn resend_invite(
    State(state): State<AppState>,
    caller: Caller,
    Path(portal_id): Path<String>,
    Json(request): Json<ResendInviteRequest>,
) -> ApiResult<PortalMember> {
    success(membership::resend_invite(&state, &caller, &portal_id, &request).await?)
}

/// GET /api/portals/{portalId}/me - The caller's own membership, or null.
pub async fn get_my_membership(
    State(state): State<AppState>,
    caller: Caller,
    Path(portal_id): Path<String>,
) -> ApiResult<Option<MyMembership>> {
    success(membership::get_my_membership(&state, &caller, &portal_id).await?)
}

/// DELETE /api/portal-members/{portalUserId} - Remove a member.
pub async fn remove_member(
    State(state): State<AppState>,
    caller: Caller,
    Path(member_id): Path<String>,
) -> ApiResult<PortalMember> {
    success(membership::remove_member(&state, &caller, &member_id).await?)
}

/// POST /api/invites/{token}/accept - Redeem an invite token.
pub async fn accept_invite(
    State(state): State<AppState>,
    caller: Caller,
    Path(token): Path<String>,
) -> ApiResult<PortalMember> {
    success(membership::accept_invite(&state, &caller, &token).await?)
}
