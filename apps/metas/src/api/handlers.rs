//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers. Handlers
//! translate between wire DTOs and the core, enforce the access policy,
//! and publish change events after successful mutations.

use super::{
    AppState, auth,
    types::{
        ApiError, ApiResult, CheckpointRequest, CreateKrRequest, CreateTeamRequest,
        DashboardResponse, HealthResponse, KrDetail, KrSummary, LoginRequest, LoginResponse,
        ProvisionRequest, ProvisionResponse, UpdateUserRequest,
    },
    watch::ChangeEvent,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use metas_core::{
    KrId, MetasError, Team, TeamId, UserId, UserProfile, monthly_buckets, policy, weighted_rollup,
};
use std::convert::Infallible;

// =============================================================================
// HEALTH & AUTH
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Exchange credentials for a session token.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (token, profile) = auth::login(&state, &request.email, &request.password).await?;
    tracing::info!(user = %profile.id, "Session opened");
    Ok(Json(LoginResponse { token, profile }))
}

/// The caller's own profile.
pub async fn me_handler(Extension(caller): Extension<UserProfile>) -> Json<UserProfile> {
    Json(caller)
}

// =============================================================================
// KEY RESULTS
// =============================================================================

/// List the KRs visible to the caller, with derived progress figures.
pub async fn list_krs_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
) -> ApiResult<Vec<KrSummary>> {
    let krs = { state.directory.read().await.krs() }?;
    let visible = policy::visible_krs(&caller, krs);
    Ok(Json(visible.iter().map(KrSummary::from_kr).collect()))
}

/// Create a KR in the caller's team (admins may target any team).
pub async fn create_kr_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Json(request): Json<CreateKrRequest>,
) -> ApiResult<KrSummary> {
    let team_id = match request.team_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(explicit) => {
            let explicit = TeamId::new(explicit);
            if !policy::can_administer(&caller) && caller.team_id.as_ref() != Some(&explicit) {
                return Err(MetasError::PermissionDenied(
                    "KRs can only be created in your own team".to_string(),
                )
                .into());
            }
            explicit
        }
        None => caller.team_id.clone().ok_or_else(not_assigned_to_team)?,
    };

    let kr = request.to_key_result(team_id)?;
    {
        let mut directory = state.directory.write().await;
        if directory.get_team(&kr.team_id)?.is_none() {
            return Err(
                MetasError::NotFound(format!("Team '{}' does not exist", kr.team_id)).into()
            );
        }
        directory.put_kr(kr.clone())?;
    }

    state.feed.publish(ChangeEvent::KrUpserted { id: kr.id.clone() });
    tracing::info!(kr = %kr.id, team = %kr.team_id, "KR created");
    Ok(Json(KrSummary::from_kr(&kr)))
}

/// Full KR detail: derived figures, raw checkpoints, monthly buckets.
pub async fn kr_detail_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<KrDetail> {
    let kr = { state.directory.read().await.get_kr(&KrId::new(&id)) }?
        .ok_or_else(|| MetasError::NotFound(format!("KR '{id}' does not exist")))?;

    if !policy::can_view(&caller, &kr) {
        return Err(
            MetasError::PermissionDenied("This KR belongs to another team".to_string()).into()
        );
    }

    Ok(Json(KrDetail {
        summary: KrSummary::from_kr(&kr),
        monthly: monthly_buckets(&kr.checkpoints),
        checkpoints: kr.checkpoints,
    }))
}

/// Append a checkpoint, stamped with the caller as author.
pub async fn append_checkpoint_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(request): Json<CheckpointRequest>,
) -> ApiResult<KrDetail> {
    let kr_id = KrId::new(&id);
    let checkpoint = request.to_checkpoint(&caller.name)?;

    let kr = {
        let mut directory = state.directory.write().await;
        let kr = directory
            .get_kr(&kr_id)?
            .ok_or_else(|| MetasError::NotFound(format!("KR '{id}' does not exist")))?;
        if !policy::can_edit(&caller, &kr) {
            return Err(
                MetasError::PermissionDenied("This KR belongs to another team".to_string()).into()
            );
        }
        directory.append_checkpoint(&kr_id, checkpoint)?;
        directory
            .get_kr(&kr_id)?
            .ok_or_else(|| MetasError::Internal("KR vanished during append".to_string()))?
    };

    state.feed.publish(ChangeEvent::CheckpointAppended { kr_id });
    Ok(Json(KrDetail {
        summary: KrSummary::from_kr(&kr),
        monthly: monthly_buckets(&kr.checkpoints),
        checkpoints: kr.checkpoints,
    }))
}

// =============================================================================
// DASHBOARD & TEAMS
// =============================================================================

/// The caller's team dashboard.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
) -> ApiResult<DashboardResponse> {
    let team_id = caller.team_id.clone().ok_or_else(not_assigned_to_team)?;

    let directory = state.directory.read().await;
    let team = directory
        .get_team(&team_id)?
        .ok_or_else(|| MetasError::NotFound(format!("Team '{team_id}' does not exist")))?;
    let krs = directory.krs_for_team(&team_id)?;

    let summaries: Vec<KrSummary> = krs.iter().map(KrSummary::from_kr).collect();
    Ok(Json(DashboardResponse {
        kr_count: summaries.len(),
        on_track_count: summaries.iter().filter(|s| s.on_track).count(),
        bonus_count: summaries.iter().filter(|s| s.bonus).count(),
        rollup_percent: weighted_rollup(&krs),
        team,
    }))
}

/// List all teams (for assignment pickers).
pub async fn list_teams_handler(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    let teams = { state.directory.read().await.teams() }?;
    Ok(Json(teams))
}

// =============================================================================
// CHANGE FEED (SSE)
// =============================================================================

/// Server-sent stream of change events; one `change` event per mutation.
pub async fn watch_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.feed.subscribe();
    let stream = futures::stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.next().await?;
        let data = serde_json::to_string(&event).ok()?;
        Some((Ok(Event::default().event("change").data(data)), subscription))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

// =============================================================================
// ADMIN
// =============================================================================

/// List all user profiles. Admin only.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
) -> ApiResult<Vec<UserProfile>> {
    require_admin(&caller)?;
    let users = { state.directory.read().await.users() }?;
    Ok(Json(users))
}

/// The user-provisioning callable: create an identity and its profile.
pub async fn provision_user_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Json(request): Json<ProvisionRequest>,
) -> ApiResult<ProvisionResponse> {
    // Role before validation, matching the callable's check order
    require_admin(&caller)?;
    let new_user = request.to_new_user()?;

    let receipt = { state.directory.write().await.provision_user(&caller, &new_user) }?;

    state.feed.publish(ChangeEvent::UserUpserted { id: receipt.uid.clone() });
    tracing::info!(uid = %receipt.uid, "User provisioned");
    Ok(Json(ProvisionResponse { result: receipt.message }))
}

/// Update a user profile. Admin only; member counts follow team moves.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<UserProfile> {
    require_admin(&caller)?;
    let user_id = UserId::new(&id);

    let updated = {
        let mut directory = state.directory.write().await;
        let existing = directory
            .get_user(&user_id)?
            .ok_or_else(|| MetasError::NotFound(format!("User '{id}' does not exist")))?;
        let updated = request.apply_to(existing)?;
        directory.put_user(updated.clone())?;
        updated
    };

    state.feed.publish(ChangeEvent::UserUpserted { id: user_id });
    Ok(Json(updated))
}

/// Create a team. Admin only.
pub async fn create_team_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<UserProfile>,
    Json(request): Json<CreateTeamRequest>,
) -> ApiResult<Team> {
    require_admin(&caller)?;
    let team = request.to_team()?;

    let stored = {
        let mut directory = state.directory.write().await;
        directory.put_team(team.clone())?;
        // Re-read: the facade recounts members on write
        directory
            .get_team(&team.id)?
            .ok_or_else(|| MetasError::Internal("Team vanished during create".to_string()))?
    };

    state.feed.publish(ChangeEvent::TeamUpserted { id: stored.id.clone() });
    tracing::info!(team = %stored.id, "Team created");
    Ok(Json(stored))
}

// =============================================================================
// HELPERS
// =============================================================================

fn require_admin(caller: &UserProfile) -> Result<(), ApiError> {
    if policy::can_administer(caller) {
        Ok(())
    } else {
        Err(MetasError::PermissionDenied(
            "Only administrators may perform this action.".to_string(),
        )
        .into())
    }
}

fn not_assigned_to_team() -> MetasError {
    MetasError::InvalidArgument(
        "You are not assigned to a team. Ask an administrator to configure your profile."
            .to_string(),
    )
}
