//! # Profile Provisioner
//!
//! The admin-only provisioning operation: create an authentication
//! identity and a matching profile document in one call.
//!
//! ## Sequence
//!
//! 1. Reject callers whose stored role is not admin (`PermissionDenied`)
//! 2. Reject incomplete requests (`InvalidArgument`) — email, password,
//!    name, and job title are required; team assignment is optional
//! 3. Insert the identity record; a duplicate email is a downstream
//!    conflict surfaced as `Internal` with the provider's message
//! 4. Write the profile document keyed by the new identity's id
//! 5. If step 4 fails after step 3 succeeded, the orphaned identity is
//!    deleted before the error is surfaced (compensation)
//!
//! Concurrent calls with the same email are not serialized; the loser of
//! the race observes the conflict from step 3.

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::store::DirectoryStore;
use crate::{Account, MetasError, Result, Role, TeamId, UserId, UserProfile, policy};
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUEST / RECEIPT
// =============================================================================

/// A validated-shape provisioning request. Field *presence* is still
/// checked by the provisioner; blank strings count as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

/// Successful provisioning outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReceipt {
    /// The new identity's id (also the profile document key).
    pub uid: UserId,
    /// Human-readable success message referencing the new email.
    pub message: String,
}

// =============================================================================
// CREDENTIAL DIGEST
// =============================================================================

/// Salted BLAKE3 digest of a password, hex-encoded.
///
/// The salt is the identity's uid, so equal passwords produce distinct
/// digests across accounts. The raw password never reaches the store.
#[must_use]
pub fn password_digest(uid: &UserId, password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(uid.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

// =============================================================================
// PROVISIONER
// =============================================================================

/// The user-provisioning operation.
pub struct Provisioner;

impl Provisioner {
    /// Provision a new user as `caller`.
    pub fn provision<S: DirectoryStore + ?Sized>(
        store: &mut S,
        caller: &UserProfile,
        request: &NewUser,
    ) -> Result<ProvisionReceipt> {
        if !policy::can_administer(caller) {
            return Err(MetasError::PermissionDenied(
                "Only administrators may provision users.".to_string(),
            ));
        }

        Self::validate(request)?;

        let uid = UserId::mint();
        let account = Account {
            uid: uid.clone(),
            email: request.email.clone(),
            password_hash: password_digest(&uid, &request.password),
        };

        // Step 3: identity creation. Duplicate email (or any storage
        // failure) is a downstream error, forwarded under Internal.
        store.insert_account(account).map_err(downstream)?;

        let profile = UserProfile {
            id: uid.clone(),
            name: request.name.trim().to_string(),
            email: request.email.clone(),
            role: request.role,
            job_title: Some(request.job_title.trim().to_string()),
            team_id: request.team_id.clone(),
        };

        // Step 4 with compensation: never leave an identity without a
        // profile behind.
        if let Err(err) = store.put_user(profile) {
            let _ = store.delete_account(&request.email);
            return Err(downstream(err));
        }

        if let Some(team) = &request.team_id {
            store.refresh_member_count(team)?;
        }

        Ok(ProvisionReceipt {
            message: format!("User {} created successfully.", request.email),
            uid,
        })
    }

    /// Synchronous request validation, reported precisely per field.
    fn validate(request: &NewUser) -> Result<()> {
        for (field, value) in [
            ("email", &request.email),
            ("password", &request.password),
            ("name", &request.name),
            ("job_title", &request.job_title),
        ] {
            if value.trim().is_empty() {
                return Err(MetasError::InvalidArgument(format!(
                    "Missing required field: {field}"
                )));
            }
        }
        let email = request.email.trim();
        if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
            return Err(MetasError::InvalidArgument(format!(
                "'{email}' is not a valid email address"
            )));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        if request.name.trim().len() > MAX_NAME_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Name exceeds {MAX_NAME_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Downstream/provider failures keep their message but lose their kind:
/// the caller sees an opaque `Internal`, per the provisioning contract.
fn downstream(err: MetasError) -> MetasError {
    match err {
        MetasError::Conflict(msg)
        | MetasError::Io(msg)
        | MetasError::Serialization(msg)
        | MetasError::Internal(msg) => MetasError::Internal(msg),
        other => MetasError::Internal(other.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
