//! # redb-backed Document Store
//!
//! A disk-backed directory store using the redb embedded database:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! Documents are serialized with postcard. One table per collection,
//! keyed by the document's string id (accounts are keyed by email).

use crate::store::DirectoryStore;
use crate::{Account, KeyResult, KrId, MetasError, Result, Team, TeamId, UserId, UserProfile};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for user profiles: uid -> postcard bytes
const USERS: TableDefinition<&'static str, &'static [u8]> = TableDefinition::new("users");

/// Table for authentication identities: email -> postcard bytes
const ACCOUNTS: TableDefinition<&'static str, &'static [u8]> = TableDefinition::new("accounts");

/// Table for teams: team id -> postcard bytes
const TEAMS: TableDefinition<&'static str, &'static [u8]> = TableDefinition::new("teams");

/// Table for KRs (checkpoints embedded): kr id -> postcard bytes
const KRS: TableDefinition<&'static str, &'static [u8]> = TableDefinition::new("krs");

/// A disk-backed directory store using redb.
pub struct RedbDirectory {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDirectory").finish_non_exhaustive()
    }
}

fn io_err(e: impl std::fmt::Display) -> MetasError {
    MetasError::Io(e.to_string())
}

fn encode_err(e: impl std::fmt::Display) -> MetasError {
    MetasError::Serialization(e.to_string())
}

impl RedbDirectory {
    /// Open or create a directory database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(USERS).map_err(io_err)?;
            let _ = write_txn.open_table(ACCOUNTS).map_err(io_err)?;
            let _ = write_txn.open_table(TEAMS).map_err(io_err)?;
            let _ = write_txn.open_table(KRS).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    fn get_doc<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
    ) -> Result<Option<T>> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        match table.get(key).map_err(io_err)? {
            Some(bytes) => {
                let doc = postcard::from_bytes(bytes.value()).map_err(encode_err)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn put_doc<T: serde::Serialize>(
        &mut self,
        table: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
        doc: &T,
    ) -> Result<()> {
        let bytes = postcard::to_allocvec(doc).map_err(encode_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(io_err)?;
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn list_docs<T: serde::de::DeserializeOwned>(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
    ) -> Result<Vec<T>> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        let mut docs = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, bytes) = entry.map_err(io_err)?;
            docs.push(postcard::from_bytes(bytes.value()).map_err(encode_err)?);
        }
        Ok(docs)
    }

    fn remove_doc(
        &mut self,
        table: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
    ) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(io_err)?;
            table.remove(key).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }
}

impl DirectoryStore for RedbDirectory {
    fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.get_doc(USERS, id.as_str())
    }

    fn put_user(&mut self, user: UserProfile) -> Result<()> {
        let key = user.id.as_str().to_string();
        self.put_doc(USERS, &key, &user)
    }

    fn users(&self) -> Result<Vec<UserProfile>> {
        self.list_docs(USERS)
    }

    fn get_account(&self, email: &str) -> Result<Option<Account>> {
        self.get_doc(ACCOUNTS, email)
    }

    fn insert_account(&mut self, account: Account) -> Result<()> {
        if self.get_account(&account.email)?.is_some() {
            return Err(MetasError::Conflict(format!(
                "The email address {} is already in use by another account.",
                account.email
            )));
        }
        let key = account.email.clone();
        self.put_doc(ACCOUNTS, &key, &account)
    }

    fn delete_account(&mut self, email: &str) -> Result<()> {
        self.remove_doc(ACCOUNTS, email)
    }

    fn get_team(&self, id: &TeamId) -> Result<Option<Team>> {
        self.get_doc(TEAMS, id.as_str())
    }

    fn put_team(&mut self, team: Team) -> Result<()> {
        let key = team.id.as_str().to_string();
        self.put_doc(TEAMS, &key, &team)
    }

    fn teams(&self) -> Result<Vec<Team>> {
        self.list_docs(TEAMS)
    }

    fn get_kr(&self, id: &KrId) -> Result<Option<KeyResult>> {
        self.get_doc(KRS, id.as_str())
    }

    fn put_kr(&mut self, kr: KeyResult) -> Result<()> {
        let key = kr.id.as_str().to_string();
        self.put_doc(KRS, &key, &kr)
    }

    fn krs(&self) -> Result<Vec<KeyResult>> {
        self.list_docs(KRS)
    }
}

// =============================================================================
// TESTS
// =============================================================================
