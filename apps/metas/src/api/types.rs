//! # API Request/Response Types
//!
//! JSON structures for the HTTP API, plus the validating converters that
//! turn raw requests into domain documents. All input validation happens
//! here, at the API boundary, before data reaches the core.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use metas_core::constants::{MAX_COMMENT_LENGTH, MAX_NAME_LENGTH, MAX_UNIT_LENGTH};
use metas_core::progress::MonthlyBucket;
use metas_core::{
    Checkpoint, KeyResult, KrId, MetasError, NewUser, Role, Team, TeamId, UserId, UserProfile,
    classify, current_value, percentage,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// Wire error body: a stable error code plus a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A domain error mapped onto an HTTP status and wire body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody { code: code.to_string(), message: message.into() },
        }
    }

    /// 401 for callers with no verified identity.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }
}

impl From<MetasError> for ApiError {
    fn from(err: MetasError) -> Self {
        let (status, code) = match &err {
            MetasError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid-argument"),
            MetasError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            MetasError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission-denied"),
            MetasError::NotFound(_) => (StatusCode::NOT_FOUND, "not-found"),
            MetasError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            MetasError::Serialization(_) | MetasError::Io(_) | MetasError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        let message = match err {
            MetasError::InvalidArgument(m)
            | MetasError::Unauthenticated(m)
            | MetasError::PermissionDenied(m)
            | MetasError::NotFound(m)
            | MetasError::Conflict(m)
            | MetasError::Serialization(m)
            | MetasError::Io(m)
            | MetasError::Internal(m) => m,
        };
        Self::new(status, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Handler result alias: a JSON payload or a mapped error.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: an opaque bearer token plus the caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub profile: UserProfile,
}

// =============================================================================
// KEY RESULTS
// =============================================================================

/// A KR with its derived progress figures, as listed on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrSummary {
    pub id: KrId,
    pub name: String,
    pub team_id: TeamId,
    pub weight: f64,
    pub target_value: f64,
    pub unit: String,
    pub current_value: f64,
    pub percentage: f64,
    pub on_track: bool,
    pub bonus: bool,
}

impl KrSummary {
    /// Derive the progress figures for a stored KR.
    #[must_use]
    pub fn from_kr(kr: &KeyResult) -> Self {
        let pct = percentage(kr);
        let class = classify(pct);
        Self {
            id: kr.id.clone(),
            name: kr.name.clone(),
            team_id: kr.team_id.clone(),
            weight: kr.weight,
            target_value: kr.target_value,
            unit: kr.unit.clone(),
            current_value: current_value(kr),
            percentage: pct,
            on_track: class.on_track,
            bonus: class.bonus,
        }
    }
}

/// Full KR detail: summary plus raw checkpoints and monthly buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrDetail {
    #[serde(flatten)]
    pub summary: KrSummary,
    pub checkpoints: Vec<Checkpoint>,
    pub monthly: Vec<MonthlyBucket>,
}

/// KR creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKrRequest {
    pub name: String,
    pub weight: Option<f64>,
    pub target_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Target team; defaults to the caller's team. Only admins may name
    /// another team.
    #[serde(default)]
    pub team_id: Option<String>,
}

impl CreateKrRequest {
    /// Convert to a KeyResult for the given team, validating fields.
    pub fn to_key_result(&self, team_id: TeamId) -> Result<KeyResult, MetasError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MetasError::InvalidArgument(
                "Missing required field: name".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Name exceeds {MAX_NAME_LENGTH} characters"
            )));
        }
        let weight = self.weight.ok_or_else(|| {
            MetasError::InvalidArgument("Missing required field: weight".to_string())
        })?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(MetasError::InvalidArgument(
                "Weight must be a non-negative number".to_string(),
            ));
        }
        let target_value = self.target_value.ok_or_else(|| {
            MetasError::InvalidArgument("Missing required field: target_value".to_string())
        })?;
        if !target_value.is_finite() || target_value < 0.0 {
            return Err(MetasError::InvalidArgument(
                "Target value must be a non-negative number".to_string(),
            ));
        }
        let unit = self.unit.clone().unwrap_or_default();
        if unit.len() > MAX_UNIT_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Unit exceeds {MAX_UNIT_LENGTH} characters"
            )));
        }

        let mut kr = KeyResult::new(KrId::mint(), name, team_id, weight, target_value);
        kr.unit = unit;
        Ok(kr)
    }
}

/// Checkpoint append request.
///
/// The date is parsed leniently: a missing, empty, or unparseable date
/// yields an undated checkpoint instead of an error, and a missing value
/// counts as zero. Malformed rows degrade, they do not reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CheckpointRequest {
    /// Convert to a Checkpoint attributed to `author`.
    pub fn to_checkpoint(&self, author: &str) -> Result<Checkpoint, MetasError> {
        let comment = self.comment.clone().unwrap_or_default();
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Comment exceeds {MAX_COMMENT_LENGTH} characters"
            )));
        }
        let date = self
            .date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
        Ok(Checkpoint {
            date,
            value: self.value.unwrap_or(0.0),
            comment,
            author: author.to_string(),
        })
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Team dashboard: stored team document plus derived progress figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub team: Team,
    pub kr_count: usize,
    pub on_track_count: usize,
    pub bonus_count: usize,
    /// Weighted rollup across the team's KRs (un-rounded; display code
    /// rounds for the label).
    pub rollup_percent: f64,
}

// =============================================================================
// PROVISIONING & ADMIN
// =============================================================================

/// User provisioning request (the `createUser` callable).
///
/// All fields arrive optional so that *presence* failures surface as
/// `invalid-argument` with a precise message instead of a decode error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl ProvisionRequest {
    /// Convert to a provisioning request, validating the role here and
    /// leaving field-presence checks to the provisioner.
    pub fn to_new_user(&self) -> Result<NewUser, MetasError> {
        let role: Role = self
            .role
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| MetasError::InvalidArgument("Missing required field: role".to_string()))?
            .parse()?;

        Ok(NewUser {
            email: self.email.clone().unwrap_or_default().trim().to_string(),
            password: self.password.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            role,
            job_title: self.job_title.clone().unwrap_or_default(),
            team_id: non_empty(self.team_id.as_deref()).map(TeamId::new),
        })
    }
}

/// Provisioning response, mirroring the callable's `{result}` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub result: String,
}

/// Admin profile update. Absent fields are left unchanged; an empty
/// `team_id` string clears the team assignment (the admin form submits
/// "" for "no team").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

impl UpdateUserRequest {
    /// Apply this update to a stored profile.
    pub fn apply_to(&self, mut profile: UserProfile) -> Result<UserProfile, MetasError> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() || name.len() > MAX_NAME_LENGTH {
                return Err(MetasError::InvalidArgument(
                    "Name must be non-empty and within bounds".to_string(),
                ));
            }
            profile.name = name.to_string();
        }
        if let Some(role) = &self.role {
            profile.role = role.parse()?;
        }
        if let Some(job_title) = &self.job_title {
            profile.job_title = non_empty(Some(job_title)).map(str::to_string);
        }
        if let Some(team_id) = &self.team_id {
            profile.team_id = non_empty(Some(team_id)).map(TeamId::new);
        }
        Ok(profile)
    }
}

/// Team creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub leader_id: Option<String>,
}

impl CreateTeamRequest {
    /// Convert to a Team document, validating fields.
    pub fn to_team(&self) -> Result<Team, MetasError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MetasError::InvalidArgument(
                "Missing required field: name".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(MetasError::InvalidArgument(format!(
                "Name exceeds {MAX_NAME_LENGTH} characters"
            )));
        }
        Ok(Team {
            id: TeamId::mint(),
            name: name.to_string(),
            leader_id: non_empty(self.leader_id.as_deref()).map(UserId::new),
            member_count: 0,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
