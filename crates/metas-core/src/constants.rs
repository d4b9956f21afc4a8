//! # Policy Constants & Input Limits
//!
//! Hardcoded runtime constants for the Metas CORE.
//!
//! Classification thresholds are policy values, not computed quantities;
//! they are exposed here as named constants so callers can reference (or
//! override, via `progress::classify_with`) the exact numbers the engine
//! applies.

/// A KR is "on track" when its completion percentage is at least this.
pub const ON_TRACK_THRESHOLD: f64 = 60.0;

/// A KR is in "bonus" (over-achievement) when its completion percentage
/// strictly exceeds this.
pub const BONUS_THRESHOLD: f64 = 100.0;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for KR, team, and user display names.
///
/// Names longer than this are rejected at the API boundary. This prevents
/// memory exhaustion from malicious or malformed input.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for a checkpoint comment.
pub const MAX_COMMENT_LENGTH: usize = 1024;

/// Maximum length for a KR unit tag (currency code, "count", ...).
pub const MAX_UNIT_LENGTH: usize = 16;

/// Maximum length for an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Minimum accepted password length for provisioning.
pub const MIN_PASSWORD_LENGTH: usize = 8;
