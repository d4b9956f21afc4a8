//! # Directory Facade
//!
//! The injected document-store client. Components never touch a global
//! handle: a `Directory` is constructed explicitly at startup and passed
//! to every operation that needs it. Shutdown is drop-based (the redb
//! backend commits per write transaction, so there is nothing to flush).
//!
//! ## Storage Backends
//!
//! - `InMemory`: BTreeMap collections (fast, volatile)
//! - `Persistent`: redb + postcard (disk-backed, ACID)
//!
//! Both backends satisfy the same `DirectoryStore` contract; the facade
//! adds the cross-collection upkeep that must hold regardless of backend
//! (team `member_count` tracking user writes).

use crate::provision::{NewUser, ProvisionReceipt, Provisioner};
use crate::storage::RedbDirectory;
use crate::store::{DirectoryStore, MemDirectory, StoreCounts};
use crate::{Account, Checkpoint, KeyResult, KrId, Result, Team, TeamId, UserId, UserProfile};
use std::path::Path;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Directory.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory collections (fast, volatile).
    InMemory(MemDirectory),
    /// Disk-backed collections using redb (ACID, persistent).
    Persistent(RedbDirectory),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemDirectory::new())
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbDirectory (database handle) cannot be safely cloned.

// =============================================================================
// DIRECTORY
// =============================================================================

/// The document-store client for users, accounts, teams, and KRs.
#[derive(Debug, Default)]
pub struct Directory {
    backend: StorageBackend,
}

impl Directory {
    /// Create an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory over an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemDirectory) -> Self {
        Self { backend: StorageBackend::InMemory(store) }
    }

    /// Open or create a persistent directory at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { backend: StorageBackend::Persistent(RedbDirectory::open(path)?) })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    fn store(&self) -> &dyn DirectoryStore {
        match &self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn DirectoryStore {
        match &mut self.backend {
            StorageBackend::InMemory(store) => store,
            StorageBackend::Persistent(store) => store,
        }
    }

    // =========================================================================
    // USERS & ACCOUNTS
    // =========================================================================

    /// Get a user profile by id.
    pub fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.store().get_user(id)
    }

    /// List all user profiles.
    pub fn users(&self) -> Result<Vec<UserProfile>> {
        self.store().users()
    }

    /// List the members of a team.
    pub fn users_for_team(&self, team: &TeamId) -> Result<Vec<UserProfile>> {
        self.store().users_for_team(team)
    }

    /// Create or replace a user profile, keeping the stored member counts
    /// of the user's previous and next team in sync.
    pub fn put_user(&mut self, user: UserProfile) -> Result<()> {
        let previous_team = self.store().get_user(&user.id)?.and_then(|u| u.team_id);
        let next_team = user.team_id.clone();

        self.store_mut().put_user(user)?;

        if let Some(team) = &previous_team {
            self.store_mut().refresh_member_count(team)?;
        }
        if let Some(team) = &next_team
            && previous_team.as_ref() != Some(team)
        {
            self.store_mut().refresh_member_count(team)?;
        }
        Ok(())
    }

    /// Get an authentication identity by email.
    pub fn get_account(&self, email: &str) -> Result<Option<Account>> {
        self.store().get_account(email)
    }

    /// Create an identity record directly (bootstrap path only; regular
    /// provisioning goes through [`Directory::provision_user`]).
    pub fn insert_account(&mut self, account: Account) -> Result<()> {
        self.store_mut().insert_account(account)
    }

    /// Run the provisioning operation as `caller`.
    pub fn provision_user(&mut self, caller: &UserProfile, request: &NewUser) -> Result<ProvisionReceipt> {
        Provisioner::provision(self.store_mut(), caller, request)
    }

    // =========================================================================
    // TEAMS
    // =========================================================================

    /// Get a team by id.
    pub fn get_team(&self, id: &TeamId) -> Result<Option<Team>> {
        self.store().get_team(id)
    }

    /// Create or replace a team. The stored member count is recounted so
    /// a team created after its members joins with the right figure.
    pub fn put_team(&mut self, team: Team) -> Result<()> {
        let id = team.id.clone();
        self.store_mut().put_team(team)?;
        self.store_mut().refresh_member_count(&id)
    }

    /// List all teams.
    pub fn teams(&self) -> Result<Vec<Team>> {
        self.store().teams()
    }

    // =========================================================================
    // KEY RESULTS
    // =========================================================================

    /// Get a KR by id.
    pub fn get_kr(&self, id: &KrId) -> Result<Option<KeyResult>> {
        self.store().get_kr(id)
    }

    /// Create or replace a KR.
    pub fn put_kr(&mut self, kr: KeyResult) -> Result<()> {
        self.store_mut().put_kr(kr)
    }

    /// List all KRs.
    pub fn krs(&self) -> Result<Vec<KeyResult>> {
        self.store().krs()
    }

    /// List the KRs owned by a team.
    pub fn krs_for_team(&self, team: &TeamId) -> Result<Vec<KeyResult>> {
        self.store().krs_for_team(team)
    }

    /// Append a checkpoint to an existing KR.
    pub fn append_checkpoint(&mut self, id: &KrId, checkpoint: Checkpoint) -> Result<()> {
        self.store_mut().append_checkpoint(id, checkpoint)
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Collection sizes.
    pub fn counts(&self) -> Result<StoreCounts> {
        self.store().counts()
    }
}

// =============================================================================
// TESTS
// =============================================================================
