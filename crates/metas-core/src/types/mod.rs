//! # Core Type Definitions
//!
//! This module contains the domain documents for the Metas OKR tracker:
//! - Opaque identifiers (`UserId`, `TeamId`, `KrId`)
//! - Role model (`Role`)
//! - Stored documents (`KeyResult`, `Checkpoint`, `UserProfile`, `Account`, `Team`)
//! - Error types (`MetasError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they are used as `BTreeMap` keys
//! - Serialize identically through serde_json (API) and postcard (store)
//! - Carry no derived quantities; percentages and rollups are always
//!   recomputed by the progress engine on read

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a user profile (and its authentication identity).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Unique identifier for a team.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

/// Unique identifier for a Key Result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KrId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Create an identifier from an existing string.
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Mint a fresh random identifier.
            #[must_use]
            pub fn mint() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UserId);
string_id!(TeamId);
string_id!(KrId);

// =============================================================================
// ROLES
// =============================================================================

/// User role, ordered from least to most privileged.
///
/// The wire names match the original deployment's role strings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Team member: sees and updates their own team's KRs.
    #[default]
    Colaborador,
    /// Team lead: same visibility as a member.
    Gestor,
    /// Administrator: full visibility, user and team management.
    Admin,
}

impl Role {
    /// Get the wire name of this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Colaborador => "colaborador",
            Role::Gestor => "gestor",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = MetasError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "colaborador" => Ok(Role::Colaborador),
            "gestor" => Ok(Role::Gestor),
            "admin" => Ok(Role::Admin),
            other => Err(MetasError::InvalidArgument(format!(
                "Unknown role '{other}' (expected colaborador, gestor, or admin)"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CHECKPOINTS
// =============================================================================

/// One dated, attributed observation contributing to a KR's current value.
///
/// Checkpoints are append-only from the engine's point of view. Insertion
/// order is NOT guaranteed to be chronological; any chronological
/// computation sorts by `date` first. A checkpoint without a date still
/// counts toward the current value but is excluded from monthly buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Checkpoint {
    /// Observation date. `None` when the source row carried no usable date.
    //
    // Stored documents serialize every field: postcard is not
    // self-describing, so optional fields may default on read but must
    // never be skipped on write.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Incremental contribution to the KR's current value.
    #[serde(default)]
    pub value: f64,
    /// Free-text note attached by the author.
    #[serde(default)]
    pub comment: String,
    /// Display name of the user who recorded the checkpoint.
    #[serde(default)]
    pub author: String,
}

impl Checkpoint {
    /// Create a dated checkpoint.
    #[must_use]
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date: Some(date),
            value,
            comment: String::new(),
            author: String::new(),
        }
    }
}

// =============================================================================
// KEY RESULTS
// =============================================================================

/// A measurable sub-goal with a numeric target, scoped to one team.
///
/// `weight` is the KR's percentage-points contribution to a team rollup.
/// Weights across a comparison set are not guaranteed to sum to 100 and
/// the rollup tolerates that. `target_value` may be zero, in which case
/// the completion percentage is defined as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: KrId,
    pub name: String,
    pub team_id: TeamId,
    pub weight: f64,
    pub target_value: f64,
    /// Display/formatting tag (currency code, plain count). Never affects
    /// the math.
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

impl KeyResult {
    /// Create an empty KR with no checkpoints.
    #[must_use]
    pub fn new(
        id: KrId,
        name: impl Into<String>,
        team_id: TeamId,
        weight: f64,
        target_value: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            team_id,
            weight,
            target_value,
            unit: String::new(),
            checkpoints: Vec::new(),
        }
    }
}

// =============================================================================
// USERS & ACCOUNTS
// =============================================================================

/// User profile document, keyed by the authentication identity's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub team_id: Option<TeamId>,
}

/// Authentication identity record, keyed by email.
///
/// `password_hash` is a salted BLAKE3 digest (salt = the profile's uid);
/// see `provision::password_digest`. The raw password is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub uid: UserId,
    pub email: String,
    pub password_hash: String,
}

// =============================================================================
// TEAMS
// =============================================================================

/// A team owning a set of KRs and users.
///
/// `member_count` is maintained by the directory on every user write; it
/// is stored (not derived on read) to match the document shape consumed
/// by dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<UserId>,
    #[serde(default)]
    pub member_count: u32,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Metas system.
///
/// - Validation and authorization errors are detected before any mutation
/// - Downstream/storage errors carry the underlying message
/// - The progress engine never returns errors; it degrades to zero
#[derive(Debug, Error)]
pub enum MetasError {
    /// A required input is missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller has no verified identity.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is signed in but lacks the required role.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The requested document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// An opaque downstream failure, message forwarded.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, MetasError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names_round_trip() {
        for role in [Role::Colaborador, Role::Gestor, Role::Admin] {
            let json = serde_json::to_string(&role).expect("serialize");
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            let back: Role = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().expect("parse"), Role::Admin);
        assert_eq!(" GESTOR ".parse::<Role>().expect("parse"), Role::Gestor);
        assert!("director".parse::<Role>().is_err());
    }

    #[test]
    fn role_ordering_reflects_privilege() {
        assert!(Role::Colaborador < Role::Gestor);
        assert!(Role::Gestor < Role::Admin);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = KrId::new("kr-1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"kr-1\"");
    }

    #[test]
    fn minted_ids_are_unique() {
        assert_ne!(UserId::mint(), UserId::mint());
    }

    #[test]
    fn checkpoint_missing_fields_default() {
        let cp: Checkpoint = serde_json::from_str("{}").expect("deserialize");
        assert!(cp.date.is_none());
        assert_eq!(cp.value, 0.0);
        assert!(cp.comment.is_empty());
    }

    #[test]
    fn profile_always_carries_optional_fields() {
        // The original deployment wrote teamId even when empty so the
        // field always exists; null plays that role here.
        let profile = UserProfile {
            id: UserId::new("u1"),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Role::Colaborador,
            job_title: None,
            team_id: None,
        };
        let json = serde_json::to_string(&profile).expect("serialize");
        assert!(json.contains("\"job_title\":null"));
        assert!(json.contains("\"team_id\":null"));
    }

    #[test]
    fn profile_postcard_round_trip_with_mixed_optionals() {
        let profile = UserProfile {
            id: UserId::new("u1"),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role: Role::Gestor,
            job_title: None,
            team_id: Some(TeamId::new("t1")),
        };
        let bytes = postcard::to_allocvec(&profile).expect("encode");
        let back: UserProfile = postcard::from_bytes(&bytes).expect("decode");
        assert_eq!(back, profile);
    }
}
