//! # Access Policy
//!
//! Role/team visibility and administration decisions.
//!
//! The progress engine performs no authorization itself; it expects its
//! callers to pass collections already filtered through this module.
//! Scoping is team-based: a KR belongs to exactly one team, and a
//! non-admin caller sees exactly the KRs of their own team.

use crate::{KeyResult, Role, UserProfile};

/// Whether the caller may see a KR.
///
/// Admins see everything; gestores and colaboradores see KRs of their
/// own team. A caller with no team assignment sees nothing.
#[must_use]
pub fn can_view(caller: &UserProfile, kr: &KeyResult) -> bool {
    if caller.role == Role::Admin {
        return true;
    }
    caller.team_id.as_ref() == Some(&kr.team_id)
}

/// Whether the caller may create KRs in, or append checkpoints to, a KR's
/// team. Same rule as visibility: membership or admin.
#[must_use]
pub fn can_edit(caller: &UserProfile, kr: &KeyResult) -> bool {
    can_view(caller, kr)
}

/// Whether the caller may perform administrative actions (provision
/// users, edit profiles, manage teams).
#[must_use]
pub fn can_administer(caller: &UserProfile) -> bool {
    caller.role == Role::Admin
}

/// The pre-filtering step the engine expects: keep only the KRs the
/// caller may see, preserving input order.
#[must_use]
pub fn visible_krs(caller: &UserProfile, krs: Vec<KeyResult>) -> Vec<KeyResult> {
    krs.into_iter().filter(|kr| can_view(caller, kr)).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KrId, TeamId, UserId};

    fn user(role: Role, team: Option<&str>) -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role,
            job_title: None,
            team_id: team.map(TeamId::new),
        }
    }

    fn kr(team: &str) -> KeyResult {
        KeyResult::new(KrId::new("kr"), "test", TeamId::new(team), 50.0, 100.0)
    }

    #[test]
    fn admin_sees_all_teams() {
        let admin = user(Role::Admin, None);
        assert!(can_view(&admin, &kr("t1")));
        assert!(can_view(&admin, &kr("t2")));
    }

    #[test]
    fn member_sees_only_own_team() {
        let member = user(Role::Colaborador, Some("t1"));
        assert!(can_view(&member, &kr("t1")));
        assert!(!can_view(&member, &kr("t2")));
    }

    #[test]
    fn gestor_has_member_visibility() {
        let gestor = user(Role::Gestor, Some("t1"));
        assert!(can_view(&gestor, &kr("t1")));
        assert!(!can_view(&gestor, &kr("t2")));
        assert!(!can_administer(&gestor));
    }

    #[test]
    fn teamless_member_sees_nothing() {
        let member = user(Role::Colaborador, None);
        assert!(!can_view(&member, &kr("t1")));
    }

    #[test]
    fn only_admin_administers() {
        assert!(can_administer(&user(Role::Admin, None)));
        assert!(!can_administer(&user(Role::Gestor, Some("t1"))));
        assert!(!can_administer(&user(Role::Colaborador, Some("t1"))));
    }

    #[test]
    fn visible_krs_filters_and_preserves_order() {
        let member = user(Role::Colaborador, Some("t1"));
        let mut a = kr("t1");
        a.name = "a".to_string();
        let b = kr("t2");
        let mut c = kr("t1");
        c.name = "c".to_string();

        let visible = visible_krs(&member, vec![a, b, c]);
        let names: Vec<&str> = visible.iter().map(|kr| kr.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
