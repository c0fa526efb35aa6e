//! Membership lifecycle: invited -> active -> removed.
//!
//! `active` is reachable from `invited` two ways, by redeeming the token or by
//! the login sweep over the caller's email. Both are conditional updates on
//! `status = 'invited'`, so only one of them can win for a given row.

use tracing::info;
use validator::Validate;

use crate::auth::{normalize_email, Caller};
use crate::errors::AppError;
use crate::models::{
    actions, InviteRequest, MemberRole, MemberStatus, MemberView, MyMembership, PortalMember,
    ResendInviteRequest, SessionSync,
};
use crate::notify::{dispatch, Notification};
use crate::portal::access::require_portal_owner;
use crate::AppState;

/// 256 bits from the thread-local CSPRNG, hex encoded.
pub fn generate_invite_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Lowercase the email, then check its shape.
fn normalize_invite(request: &InviteRequest) -> Result<InviteRequest, AppError> {
    let request = InviteRequest {
        email: normalize_email(&request.email),
        role: request.role,
    };
    request.validate()?;
    Ok(request)
}

/// Invite an email to a portal, or re-invite a removed one.
pub async fn invite(
    state: &AppState,
    caller: &Caller,
    portal_id: &str,
    request: &InviteRequest,
) -> Result<PortalMember, AppError> {
    let portal = require_portal_owner(&state.repo, caller, portal_id).await?;
    let request = normalize_invite(request)?;
    let email = request.email;

    if email == caller.email {
        return Err(AppError::Validation(
            "You already own this portal".to_string(),
        ));
    }

    let role = request.role.unwrap_or_default();
    if role == MemberRole::Owner {
        return Err(AppError::Validation(
            "The owner role cannot be granted by invitation".to_string(),
        ));
    }

    let existing_user = state.repo.find_user_id_by_email(&email).await?;
    let token = match existing_user {
        Some(_) => None,
        None => Some(generate_invite_token()),
    };

    let outcome = state
        .repo
        .upsert_invite(
            &portal,
            &email,
            role,
            &caller.id,
            existing_user.as_deref(),
            token.as_deref(),
        )
        .await?;

    if !outcome.changed {
        info!(portal_id = %portal.id, member_id = %outcome.member.id, "Member already active");
        return Ok(outcome.member);
    }

    // The membership write is committed; delivery problems only get logged
    let notification = match (&outcome.member.status, &outcome.member.invite_token) {
        (MemberStatus::Invited, Some(token)) => {
            Notification::invite(&email, &portal.name, &state.config.invite_url(token))
        }
        _ => Notification::added(&email, &portal.name),
    };
    dispatch(state.notifier.as_ref(), notification);

    info!(
        portal_id = %portal.id,
        member_id = %outcome.member.id,
        status = outcome.member.status.as_str(),
        "Member invited"
    );

    Ok(outcome.member)
}

/// Redeem an invite token for the authenticated caller. Tokens are single-use.
pub async fn accept_invite(
    state: &AppState,
    caller: &Caller,
    token: &str,
) -> Result<PortalMember, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::InvalidToken);
    }

    let member = state
        .repo
        .accept_invite(token, &caller.id, &caller.email)
        .await?
        .ok_or(AppError::InvalidToken)?;

    info!(
        portal_id = %member.portal_id,
        member_id = %member.id,
        user_id = %caller.id,
        "Invite accepted"
    );
    Ok(member)
}

/// Login/signup sweep: activate every pending invite for the caller's email.
pub async fn activate_pending_invites(
    state: &AppState,
    caller: &Caller,
) -> Result<SessionSync, AppError> {
    let activated = state
        .repo
        .activate_pending_invites(&caller.id, &caller.email)
        .await?;

    if activated > 0 {
        info!(user_id = %caller.id, activated, "Activated pending invites");
    }

    Ok(SessionSync {
        user_id: caller.id.clone(),
        activated,
    })
}

/// All membership rows of a portal. Owner only.
pub async fn list_members(
    state: &AppState,
    caller: &Caller,
    portal_id: &str,
) -> Result<Vec<MemberView>, AppError> {
    let portal = require_portal_owner(&state.repo, caller, portal_id).await?;
    state.repo.list_members(&portal.id).await
}

/// Soft-remove a member. Only the owner of the member's portal may do this.
pub async fn remove_member(
    state: &AppState,
    caller: &Caller,
    member_id: &str,
) -> Result<PortalMember, AppError> {
    let mut member = state
        .repo
        .get_member(member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;

    let portal = require_portal_owner(&state.repo, caller, &member.portal_id).await?;

    if member.role == MemberRole::Owner {
        return Err(AppError::Forbidden(
            "The portal owner cannot be removed".to_string(),
        ));
    }

    if member.status == MemberStatus::Removed {
        return Ok(member);
    }

    if !state
        .repo
        .remove_member(&member, &portal.project_id, &caller.id)
        .await?
    {
        return Err(AppError::Forbidden(
            "The portal owner cannot be removed".to_string(),
        ));
    }

    member.status = MemberStatus::Removed;
    member.invite_token = None;

    info!(portal_id = %portal.id, member_id = %member.id, "Member removed");
    Ok(member)
}

/// Send the pending invitation again. The existing token is reused, so links
/// from earlier emails keep working until one of them is redeemed.
pub async fn resend_invite(
    state: &AppState,
    caller: &Caller,
    portal_id: &str,
    request: &ResendInviteRequest,
) -> Result<PortalMember, AppError> {
    let portal = require_portal_owner(&state.repo, caller, portal_id).await?;
    let request = ResendInviteRequest {
        email: normalize_email(&request.email),
    };
    request.validate()?;
    let email = request.email;

    let member = state
        .repo
        .find_member_by_email(&portal.id, &email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No invitation found for {}", email)))?;

    let token = match member.status {
        MemberStatus::Active => {
            return Err(AppError::AlreadyActive(format!(
                "{} has already joined this portal",
                email
            )))
        }
        MemberStatus::Removed => {
            return Err(AppError::Validation(format!(
                "{} was removed; send a new invitation instead",
                email
            )))
        }
        MemberStatus::Invited => member.invite_token.as_deref().ok_or_else(|| {
            AppError::Internal(format!("Pending invitation {} has no token", member.id))
        })?,
    };

    dispatch(
        state.notifier.as_ref(),
        Notification::invite(&email, &portal.name, &state.config.invite_url(token)),
    );

    state
        .repo
        .record_activity(
            &portal.project_id,
            &caller.id,
            actions::INVITE_RESENT,
            Some(email.as_str()),
        )
        .await?;

    info!(portal_id = %portal.id, member_id = %member.id, "Invite resent");
    Ok(member)
}

/// The caller's own membership. Never fails authorization: `None` means the
/// caller has no relationship to the portal.
pub async fn get_my_membership(
    state: &AppState,
    caller: &Caller,
    portal_id: &str,
) -> Result<Option<MyMembership>, AppError> {
    let Some(portal) = state.repo.get_portal(portal_id).await? else {
        return Ok(None);
    };

    if let Some(member) = state
        .repo
        .find_membership_for(&portal.id, &caller.id, &caller.email, false)
        .await?
    {
        return Ok(Some(member.into()));
    }

    if portal.owner_id == caller.id {
        return Ok(Some(MyMembership::synthesized_owner(
            &portal.id,
            &caller.email,
        )));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_tokens_are_long_and_unique() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    fn invite_for(email: &str) -> InviteRequest {
        InviteRequest {
            email: email.to_string(),
            role: None,
        }
    }

    #[test]
    fn test_normalize_invite() {
        let request = normalize_invite(&invite_for(" Bob@Example.com ")).unwrap();
        assert_eq!(request.email, "bob@example.com");
        assert!(request.role.is_none());

        for bad in [
            "not-an-email",
            "@example.com",
            "",
            "a@@x.com",
            "a@x.com@y.com",
            "a@.",
            "a@x..com",
        ] {
            assert!(
                matches!(
                    normalize_invite(&invite_for(bad)),
                    Err(AppError::Validation(_))
                ),
                "accepted {:?}",
                bad
            );
        }
    }
}
