//! # Document Store Interface
//!
//! The `DirectoryStore` trait defines the document collections every
//! backend must provide (`users`, `accounts`, `teams`, `krs`), plus the
//! cross-collection upkeep shared by all backends as default methods.
//!
//! Two implementations exist:
//! - [`MemDirectory`] (this module): BTreeMap collections, volatile
//! - `RedbDirectory` (`storage` module): redb + postcard, persistent
//!
//! Both behave identically under the shared behavioral test suite; the
//! `Directory` facade dispatches to either at runtime.

use crate::{Account, Checkpoint, KeyResult, KrId, MetasError, Result, Team, TeamId, UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STORE COUNTS
// =============================================================================

/// Collection sizes, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreCounts {
    pub users: usize,
    pub teams: usize,
    pub krs: usize,
}

// =============================================================================
// DIRECTORY STORE TRAIT
// =============================================================================

/// Backend-agnostic document store operations.
///
/// Put operations are upserts; `insert_account` is the one creation
/// operation with uniqueness semantics (duplicate email is a
/// [`MetasError::Conflict`]). KRs are never deleted: no delete operation
/// is defined for them.
pub trait DirectoryStore {
    // --- users ---------------------------------------------------------------

    /// Get a user profile by id.
    fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>>;

    /// Create or replace a user profile.
    fn put_user(&mut self, user: UserProfile) -> Result<()>;

    /// List all user profiles, ordered by id.
    fn users(&self) -> Result<Vec<UserProfile>>;

    /// List the members of a team.
    fn users_for_team(&self, team: &TeamId) -> Result<Vec<UserProfile>> {
        Ok(self
            .users()?
            .into_iter()
            .filter(|u| u.team_id.as_ref() == Some(team))
            .collect())
    }

    // --- accounts ------------------------------------------------------------

    /// Get an authentication identity by email.
    fn get_account(&self, email: &str) -> Result<Option<Account>>;

    /// Create an identity record. Fails with [`MetasError::Conflict`] if
    /// the email is already registered.
    fn insert_account(&mut self, account: Account) -> Result<()>;

    /// Delete an identity record. Missing records are not an error (the
    /// caller is compensating, not asserting existence).
    fn delete_account(&mut self, email: &str) -> Result<()>;

    // --- teams ---------------------------------------------------------------

    /// Get a team by id.
    fn get_team(&self, id: &TeamId) -> Result<Option<Team>>;

    /// Create or replace a team.
    fn put_team(&mut self, team: Team) -> Result<()>;

    /// List all teams, ordered by id.
    fn teams(&self) -> Result<Vec<Team>>;

    // --- krs -----------------------------------------------------------------

    /// Get a KR by id.
    fn get_kr(&self, id: &KrId) -> Result<Option<KeyResult>>;

    /// Create or replace a KR.
    fn put_kr(&mut self, kr: KeyResult) -> Result<()>;

    /// List all KRs, ordered by id.
    fn krs(&self) -> Result<Vec<KeyResult>>;

    /// List the KRs owned by a team.
    fn krs_for_team(&self, team: &TeamId) -> Result<Vec<KeyResult>> {
        Ok(self
            .krs()?
            .into_iter()
            .filter(|kr| &kr.team_id == team)
            .collect())
    }

    /// Append a checkpoint to an existing KR.
    fn append_checkpoint(&mut self, id: &KrId, checkpoint: Checkpoint) -> Result<()> {
        let mut kr = self
            .get_kr(id)?
            .ok_or_else(|| MetasError::NotFound(format!("KR '{id}' does not exist")))?;
        kr.checkpoints.push(checkpoint);
        self.put_kr(kr)
    }

    // --- upkeep --------------------------------------------------------------

    /// Recount a team's members and persist the stored `member_count`.
    /// A no-op for teams that do not exist.
    fn refresh_member_count(&mut self, team: &TeamId) -> Result<()> {
        let count = self.users_for_team(team)?.len() as u32;
        if let Some(mut stored) = self.get_team(team)? {
            stored.member_count = count;
            self.put_team(stored)?;
        }
        Ok(())
    }

    /// Collection sizes.
    fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            users: self.users()?.len(),
            teams: self.teams()?.len(),
            krs: self.krs()?.len(),
        })
    }
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

/// Volatile in-memory document store.
///
/// Uses `BTreeMap` for deterministic listing order. This is the default
/// backend for tests and the HTTP server's ephemeral mode.
#[derive(Debug, Clone, Default)]
pub struct MemDirectory {
    users: BTreeMap<String, UserProfile>,
    accounts: BTreeMap<String, Account>,
    teams: BTreeMap<String, Team>,
    krs: BTreeMap<String, KeyResult>,
}

impl MemDirectory {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectoryStore for MemDirectory {
    fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.get(id.as_str()).cloned())
    }

    fn put_user(&mut self, user: UserProfile) -> Result<()> {
        self.users.insert(user.id.as_str().to_string(), user);
        Ok(())
    }

    fn users(&self) -> Result<Vec<UserProfile>> {
        Ok(self.users.values().cloned().collect())
    }

    fn get_account(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.get(email).cloned())
    }

    fn insert_account(&mut self, account: Account) -> Result<()> {
        if self.accounts.contains_key(&account.email) {
            return Err(MetasError::Conflict(format!(
                "The email address {} is already in use by another account.",
                account.email
            )));
        }
        self.accounts.insert(account.email.clone(), account);
        Ok(())
    }

    fn delete_account(&mut self, email: &str) -> Result<()> {
        self.accounts.remove(email);
        Ok(())
    }

    fn get_team(&self, id: &TeamId) -> Result<Option<Team>> {
        Ok(self.teams.get(id.as_str()).cloned())
    }

    fn put_team(&mut self, team: Team) -> Result<()> {
        self.teams.insert(team.id.as_str().to_string(), team);
        Ok(())
    }

    fn teams(&self) -> Result<Vec<Team>> {
        Ok(self.teams.values().cloned().collect())
    }

    fn get_kr(&self, id: &KrId) -> Result<Option<KeyResult>> {
        Ok(self.krs.get(id.as_str()).cloned())
    }

    fn put_kr(&mut self, kr: KeyResult) -> Result<()> {
        self.krs.insert(kr.id.as_str().to_string(), kr);
        Ok(())
    }

    fn krs(&self) -> Result<Vec<KeyResult>> {
        Ok(self.krs.values().cloned().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn profile(id: &str, team: Option<&str>) -> UserProfile {
        UserProfile {
            id: UserId::new(id),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            role: Role::Colaborador,
            job_title: None,
            team_id: team.map(TeamId::new),
        }
    }

    #[test]
    fn put_user_is_upsert() {
        let mut store = MemDirectory::new();
        store.put_user(profile("u1", None)).expect("put");
        let mut updated = profile("u1", Some("t1"));
        updated.name = "renamed".to_string();
        store.put_user(updated).expect("put");

        let users = store.users().expect("list");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "renamed");
    }

    #[test]
    fn insert_account_rejects_duplicate_email() {
        let mut store = MemDirectory::new();
        let account = Account {
            uid: UserId::new("u1"),
            email: "ana@example.com".to_string(),
            password_hash: "h1".to_string(),
        };
        store.insert_account(account.clone()).expect("first insert");

        let err = store.insert_account(account).expect_err("duplicate");
        assert!(matches!(err, MetasError::Conflict(_)));
        assert!(err.to_string().contains("ana@example.com"));
    }

    #[test]
    fn delete_account_is_idempotent() {
        let mut store = MemDirectory::new();
        store.delete_account("missing@example.com").expect("no-op delete");
    }

    #[test]
    fn append_checkpoint_requires_existing_kr() {
        let mut store = MemDirectory::new();
        let err = store
            .append_checkpoint(&KrId::new("missing"), Checkpoint::default())
            .expect_err("missing KR");
        assert!(matches!(err, MetasError::NotFound(_)));
    }

    #[test]
    fn append_checkpoint_preserves_insertion_order() {
        let mut store = MemDirectory::new();
        let kr = KeyResult::new(KrId::new("kr1"), "test", TeamId::new("t1"), 50.0, 100.0);
        store.put_kr(kr).expect("put");

        for value in [3.0, 1.0, 2.0] {
            store
                .append_checkpoint(&KrId::new("kr1"), Checkpoint { value, ..Checkpoint::default() })
                .expect("append");
        }

        let kr = store.get_kr(&KrId::new("kr1")).expect("get").expect("exists");
        let values: Vec<f64> = kr.checkpoints.iter().map(|cp| cp.value).collect();
        assert_eq!(values, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn krs_for_team_filters() {
        let mut store = MemDirectory::new();
        store
            .put_kr(KeyResult::new(KrId::new("a"), "a", TeamId::new("t1"), 1.0, 1.0))
            .expect("put");
        store
            .put_kr(KeyResult::new(KrId::new("b"), "b", TeamId::new("t2"), 1.0, 1.0))
            .expect("put");

        let krs = store.krs_for_team(&TeamId::new("t1")).expect("list");
        assert_eq!(krs.len(), 1);
        assert_eq!(krs[0].id.as_str(), "a");
    }

    #[test]
    fn refresh_member_count_recounts() {
        let mut store = MemDirectory::new();
        store
            .put_team(Team {
                id: TeamId::new("t1"),
                name: "Growth".to_string(),
                leader_id: None,
                member_count: 0,
            })
            .expect("put team");
        store.put_user(profile("u1", Some("t1"))).expect("put");
        store.put_user(profile("u2", Some("t1"))).expect("put");
        store.put_user(profile("u3", Some("t2"))).expect("put");

        store.refresh_member_count(&TeamId::new("t1")).expect("refresh");
        let team = store.get_team(&TeamId::new("t1")).expect("get").expect("exists");
        assert_eq!(team.member_count, 2);
    }

    #[test]
    fn refresh_member_count_missing_team_is_noop() {
        let mut store = MemDirectory::new();
        store.refresh_member_count(&TeamId::new("ghost")).expect("no-op");
    }

    #[test]
    fn counts_reflect_collections() {
        let mut store = MemDirectory::new();
        store.put_user(profile("u1", None)).expect("put");
        store
            .put_kr(KeyResult::new(KrId::new("a"), "a", TeamId::new("t1"), 1.0, 1.0))
            .expect("put");

        let counts = store.counts().expect("counts");
        assert_eq!(counts, StoreCounts { users: 1, teams: 0, krs: 1 });
    }
}
