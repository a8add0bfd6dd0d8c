//! Group membership hierarchy.
//!
//! Governs member management inside a group chat (removal, promotion,
//! demotion). Message pinning and deletion are decided by
//! [`crate::permissions`] and do not consult roles.

use scout_shared::models::GroupRole;
use serde::Serialize;

use crate::error::ActionDenied;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAction {
    Remove,
    PromoteToModerator,
    PromoteToAdmin,
    Demote,
}

impl MemberAction {
    pub fn verb(self) -> &'static str {
        match self {
            MemberAction::Remove => "remove",
            MemberAction::PromoteToModerator => "promote to moderator",
            MemberAction::PromoteToAdmin => "promote to admin",
            MemberAction::Demote => "demote",
        }
    }
}

/// Whether `actor` may perform `action` on a member holding `target`.
pub fn can_act_on_member(
    actor: GroupRole,
    target: GroupRole,
    action: MemberAction,
) -> Result<(), ActionDenied> {
    match target {
        GroupRole::AdminExecutive => {
            return Err(ActionDenied(
                "Executive admins cannot be removed (system-assigned role)".into(),
            ))
        }
        GroupRole::Creator => {
            return Err(ActionDenied(
                "The group creator cannot be removed or demoted".into(),
            ))
        }
        _ => {}
    }

    if actor.rank() <= target.rank() {
        return Err(ActionDenied(format!(
            "Only users with higher authority can {} a {}",
            action.verb(),
            target
        )));
    }

    let admin = GroupRole::Admin.rank();
    let executive = GroupRole::AdminExecutive.rank();

    match action {
        MemberAction::Remove => {
            if actor == GroupRole::Moderator && target != GroupRole::Member {
                return Err(ActionDenied("Moderators can only remove regular members".into()));
            }
        }
        MemberAction::PromoteToModerator => {
            if actor.rank() < admin {
                return Err(ActionDenied(
                    "Only admins and creators can promote to moderator".into(),
                ));
            }
            if target != GroupRole::Member {
                return Err(ActionDenied(format!("User already has role: {target}")));
            }
        }
        MemberAction::PromoteToAdmin => {
            if actor.rank() < executive {
                return Err(ActionDenied(
                    "Only executive admins and creators can promote to admin".into(),
                ));
            }
            if !matches!(target, GroupRole::Member | GroupRole::Moderator) {
                return Err(ActionDenied(format!("User already has role: {target}")));
            }
        }
        MemberAction::Demote => {
            let allowed = (actor.rank() >= admin && target == GroupRole::Moderator)
                || (actor.rank() >= executive && target == GroupRole::Admin);
            if !allowed {
                return Err(ActionDenied(
                    "Insufficient permissions to demote this user".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Management capabilities of a role, for group settings screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupCapabilities {
    pub can_remove_members: bool,
    pub can_promote_to_moderator: bool,
    pub can_promote_to_admin: bool,
    pub can_demote_moderators: bool,
    pub can_demote_admins: bool,
    pub can_edit_settings: bool,
    pub can_invite_members: bool,
}

impl GroupCapabilities {
    pub fn for_role(role: GroupRole) -> Self {
        let rank = role.rank();
        Self {
            can_remove_members: rank >= GroupRole::Moderator.rank(),
            can_promote_to_moderator: rank >= GroupRole::Admin.rank(),
            can_promote_to_admin: rank >= GroupRole::AdminExecutive.rank(),
            can_demote_moderators: rank >= GroupRole::Admin.rank(),
            can_demote_admins: rank >= GroupRole::AdminExecutive.rank(),
            can_edit_settings: rank >= GroupRole::Admin.rank(),
            can_invite_members: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GroupRole::*;

    #[test]
    fn protected_targets() {
        for actor in [Creator, AdminExecutive, Admin, Moderator, Member] {
            for action in [
                MemberAction::Remove,
                MemberAction::PromoteToModerator,
                MemberAction::PromoteToAdmin,
                MemberAction::Demote,
            ] {
                assert!(can_act_on_member(actor, Creator, action).is_err());
                assert!(can_act_on_member(actor, AdminExecutive, action).is_err());
            }
        }
    }

    #[test]
    fn rank_must_exceed_target() {
        let err = can_act_on_member(Admin, Admin, MemberAction::Remove).unwrap_err();
        assert_eq!(err.0, "Only users with higher authority can remove a admin");
        assert!(can_act_on_member(Member, Member, MemberAction::Remove).is_err());
    }

    #[test]
    fn moderators_remove_members_only() {
        assert!(can_act_on_member(Moderator, Member, MemberAction::Remove).is_ok());
        assert!(can_act_on_member(Moderator, Member, MemberAction::PromoteToModerator).is_err());
        assert!(can_act_on_member(Admin, Moderator, MemberAction::Remove).is_ok());
    }

    #[test]
    fn promotion_matrix() {
        assert!(can_act_on_member(Admin, Member, MemberAction::PromoteToModerator).is_ok());
        assert_eq!(
            can_act_on_member(Creator, Moderator, MemberAction::PromoteToModerator)
                .unwrap_err()
                .0,
            "User already has role: moderator"
        );
        assert!(can_act_on_member(Admin, Member, MemberAction::PromoteToAdmin).is_err());
        assert!(can_act_on_member(AdminExecutive, Moderator, MemberAction::PromoteToAdmin).is_ok());
        assert!(can_act_on_member(Creator, Member, MemberAction::PromoteToAdmin).is_ok());
    }

    #[test]
    fn demotion_matrix() {
        assert!(can_act_on_member(Admin, Moderator, MemberAction::Demote).is_ok());
        assert!(can_act_on_member(AdminExecutive, Admin, MemberAction::Demote).is_ok());
        assert!(can_act_on_member(Creator, Member, MemberAction::Demote).is_err());
    }

    #[test]
    fn capabilities_by_rank() {
        let member = GroupCapabilities::for_role(Member);
        assert!(!member.can_remove_members);
        assert!(member.can_invite_members);

        let admin = GroupCapabilities::for_role(Admin);
        assert!(admin.can_promote_to_moderator && admin.can_edit_settings);
        assert!(!admin.can_promote_to_admin);

        assert!(GroupCapabilities::for_role(Creator).can_demote_admins);
    }
}
