//! # metas-core
//!
//! The deterministic OKR domain engine for Metas - THE LOGIC.
//!
//! This crate implements the CORE of the tracker: the progress engine
//! that turns a raw set of time-stamped checkpoint entries into a
//! percentage, a bonus state, and a team-weighted rollup, plus the data
//! contracts and document store around it.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Has NO async, NO network dependencies (pure Rust)
//! - Derives every progress figure on read; nothing derived is stored
//! - Never fails an aggregation: malformed rows degrade to zero
//! - Keeps all authorization decisions in the `policy` module; the
//!   progress engine only ever sees pre-filtered collections

// =============================================================================
// MODULES
// =============================================================================

pub mod constants;
pub mod directory;
pub mod policy;
pub mod progress;
pub mod provision;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Account, Checkpoint, KeyResult, KrId, MetasError, Result, Role, Team, TeamId, UserId,
    UserProfile,
};

// =============================================================================
// RE-EXPORTS: Progress Engine
// =============================================================================

pub use constants::{BONUS_THRESHOLD, ON_TRACK_THRESHOLD};
pub use progress::{
    Classification, MonthKey, MonthlyBucket, classify, classify_with, current_value,
    monthly_buckets, percentage, weighted_rollup,
};

// =============================================================================
// RE-EXPORTS: Store & Provisioning
// =============================================================================

pub use directory::{Directory, StorageBackend};
pub use provision::{NewUser, ProvisionReceipt, Provisioner, password_digest};
pub use storage::RedbDirectory;
pub use store::{DirectoryStore, MemDirectory, StoreCounts};
