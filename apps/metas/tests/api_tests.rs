//! Integration tests for the Metas HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real
//! server. Authentication is session-based, so each test logs in against
//! its own seeded directory; no shared state between tests.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use metas::api::{
    AppState, DashboardResponse, ErrorBody, HealthResponse, KrDetail, KrSummary, LoginResponse,
    ProvisionResponse, create_router,
};
use metas_core::{
    Account, Checkpoint, Directory, KeyResult, KrId, Role, Team, TeamId, UserId, UserProfile,
    password_digest,
};
use serde_json::json;

const ADMIN_PASSWORD: &str = "rootpass-123";
const MEMBER_PASSWORD: &str = "anapass-123";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn seed_user(
    directory: &mut Directory,
    id: &str,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    team: Option<&str>,
) {
    let uid = UserId::new(id);
    directory
        .insert_account(Account {
            uid: uid.clone(),
            email: email.to_string(),
            password_hash: password_digest(&uid, password),
        })
        .unwrap();
    directory
        .put_user(UserProfile {
            id: uid,
            name: name.to_string(),
            email: email.to_string(),
            role,
            job_title: None,
            team_id: team.map(TeamId::new),
        })
        .unwrap();
}

fn seed_kr(directory: &mut Directory, id: &str, team: &str, weight: f64, target: f64, values: &[f64]) {
    let mut kr = KeyResult::new(KrId::new(id), id, TeamId::new(team), weight, target);
    kr.checkpoints = values
        .iter()
        .map(|&v| Checkpoint { value: v, ..Checkpoint::default() })
        .collect();
    directory.put_kr(kr).unwrap();
}

/// Two teams, an admin, one member per team, and three KRs. Team t1's
/// KRs sit at 50% (weight 30) and 100% (weight 70): rollup 85.
fn seeded_directory() -> Directory {
    let mut directory = Directory::new();

    for (id, name) in [("t1", "Growth"), ("t2", "Platform")] {
        directory
            .put_team(Team {
                id: TeamId::new(id),
                name: name.to_string(),
                leader_id: None,
                member_count: 0,
            })
            .unwrap();
    }

    seed_user(&mut directory, "u-root", "Root", "root@example.com", ADMIN_PASSWORD, Role::Admin, None);
    seed_user(&mut directory, "u-ana", "Ana", "ana@example.com", MEMBER_PASSWORD, Role::Colaborador, Some("t1"));
    seed_user(&mut directory, "u-bob", "Bob", "bob@example.com", "bobpass-123", Role::Gestor, Some("t2"));

    seed_kr(&mut directory, "kr-t1-a", "t1", 30.0, 100.0, &[50.0]);
    seed_kr(&mut directory, "kr-t1-b", "t1", 70.0, 100.0, &[100.0]);
    seed_kr(&mut directory, "kr-t2-a", "t2", 100.0, 100.0, &[10.0]);

    directory
}

fn seeded_server() -> TestServer {
    let state = AppState::new(seeded_directory());
    TestServer::new(create_router(state)).unwrap()
}

async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    let login: LoginResponse = response.json();
    login.token
}

fn bearer(token: &str) -> HeaderValue {
    format!("Bearer {token}").parse().unwrap()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = seeded_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_health_bypasses_auth() {
    let server = seeded_server();

    // No Authorization header, still reachable
    let response = server.get("/health").await;
    response.assert_status_ok();
}

// =============================================================================
// LOGIN TESTS
// =============================================================================

#[tokio::test]
async fn test_login_success_returns_profile() {
    let server = seeded_server();

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "ana@example.com", "password": MEMBER_PASSWORD }))
        .await;

    response.assert_status_ok();
    let login: LoginResponse = response.json();
    assert!(!login.token.is_empty());
    assert_eq!(login.profile.name, "Ana");
    assert_eq!(login.profile.role, Role::Colaborador);
}

#[tokio::test]
async fn test_login_wrong_password_rejected() {
    let server = seeded_server();

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "ana@example.com", "password": "wrong-password" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "unauthenticated");
}

#[tokio::test]
async fn test_login_unknown_email_rejected() {
    let server = seeded_server();

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "ghost@example.com", "password": "whatever-123" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

// =============================================================================
// SESSION MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_missing_token_rejected() {
    let server = seeded_server();

    let response = server.get("/krs").await;

    assert_eq!(response.status_code().as_u16(), 401);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "unauthenticated");
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let server = seeded_server();

    let response = server
        .get("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer("not-a-session"))
        .await;

    assert_eq!(response.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_me_returns_caller_profile() {
    let server = seeded_server();
    let token = login(&server, "bob@example.com", "bobpass-123").await;

    let response = server
        .get("/me")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let profile: UserProfile = response.json();
    assert_eq!(profile.name, "Bob");
    assert_eq!(profile.role, Role::Gestor);
    assert_eq!(profile.team_id, Some(TeamId::new("t2")));
}

// =============================================================================
// KR LISTING TESTS
// =============================================================================

#[tokio::test]
async fn test_member_sees_only_own_team_krs() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let krs: Vec<KrSummary> = response.json();
    assert_eq!(krs.len(), 2);
    assert!(krs.iter().all(|kr| kr.team_id == TeamId::new("t1")));
}

#[tokio::test]
async fn test_admin_sees_all_krs() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .get("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let krs: Vec<KrSummary> = response.json();
    assert_eq!(krs.len(), 3);
}

#[tokio::test]
async fn test_listing_carries_derived_progress() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    let krs: Vec<KrSummary> = response.json();
    let half = krs.iter().find(|kr| kr.id == KrId::new("kr-t1-a")).unwrap();
    assert_eq!(half.percentage, 50.0);
    assert!(!half.on_track);

    let full = krs.iter().find(|kr| kr.id == KrId::new("kr-t1-b")).unwrap();
    assert_eq!(full.percentage, 100.0);
    assert!(full.on_track);
    assert!(!full.bonus);
}

// =============================================================================
// KR CREATION TESTS
// =============================================================================

#[tokio::test]
async fn test_member_creates_kr_in_own_team() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "NPS above 60", "weight": 20.0, "target_value": 60.0 }))
        .await;

    response.assert_status_ok();
    let kr: KrSummary = response.json();
    assert_eq!(kr.team_id, TeamId::new("t1"));
    assert_eq!(kr.percentage, 0.0);

    // The new KR shows up in the listing
    let listing = server
        .get("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;
    let krs: Vec<KrSummary> = listing.json();
    assert_eq!(krs.len(), 3);
}

#[tokio::test]
async fn test_member_cannot_create_kr_in_other_team() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Sneaky", "weight": 1.0, "target_value": 1.0, "team_id": "t2" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 403);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "permission-denied");
}

#[tokio::test]
async fn test_admin_creates_kr_in_any_team() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Uptime", "weight": 50.0, "target_value": 99.9, "team_id": "t2" }))
        .await;

    response.assert_status_ok();
    let kr: KrSummary = response.json();
    assert_eq!(kr.team_id, TeamId::new("t2"));
}

#[tokio::test]
async fn test_create_kr_missing_weight_rejected() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "No weight", "target_value": 10.0 }))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "invalid-argument");
}

#[tokio::test]
async fn test_create_kr_unknown_team_rejected() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Ghost", "weight": 1.0, "target_value": 1.0, "team_id": "nope" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 404);
}

// =============================================================================
// KR DETAIL & CHECKPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_kr_detail_includes_buckets() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    // Append dated checkpoints across two months
    for (date, value) in [("2026-01-10", 150.0), ("2026-01-20", 50.0), ("2026-03-05", 100.0)] {
        let response = server
            .post("/krs/kr-t1-a/checkpoints")
            .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "date": date, "value": value }))
            .await;
        response.assert_status_ok();
    }

    let response = server
        .get("/krs/kr-t1-a")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let detail: KrDetail = response.json();
    // 50 seeded (undated) + 150 + 50 + 100
    assert_eq!(detail.summary.current_value, 350.0);
    assert_eq!(detail.checkpoints.len(), 4);
    // Buckets only cover the dated rows
    assert_eq!(detail.monthly.len(), 2);
    assert_eq!(detail.monthly[0].month.to_string(), "2026-01");
    assert_eq!(detail.monthly[0].monthly_total, 200.0);
    assert_eq!(detail.monthly[1].cumulative_total, 300.0);
}

#[tokio::test]
async fn test_checkpoint_author_is_stamped_from_session() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs/kr-t1-a/checkpoints")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "date": "2026-02-01", "value": 10.0, "comment": "February close" }))
        .await;

    response.assert_status_ok();
    let detail: KrDetail = response.json();
    let last = detail.checkpoints.last().unwrap();
    assert_eq!(last.author, "Ana");
    assert_eq!(last.comment, "February close");
}

#[tokio::test]
async fn test_checkpoint_bad_date_degrades_not_rejects() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs/kr-t1-a/checkpoints")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "date": "not-a-date", "value": 25.0 }))
        .await;

    response.assert_status_ok();
    let detail: KrDetail = response.json();
    // Value counted, date absorbed to none
    assert_eq!(detail.summary.current_value, 75.0);
    assert!(detail.checkpoints.last().unwrap().date.is_none());
}

#[tokio::test]
async fn test_checkpoint_on_foreign_kr_rejected() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs/kr-t2-a/checkpoints")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "value": 1.0 }))
        .await;

    assert_eq!(response.status_code().as_u16(), 403);
}

#[tokio::test]
async fn test_detail_of_foreign_kr_rejected() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/krs/kr-t2-a")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code().as_u16(), 403);
}

#[tokio::test]
async fn test_detail_of_missing_kr_is_404() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/krs/ghost")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code().as_u16(), 404);
}

// =============================================================================
// DASHBOARD TESTS
// =============================================================================

#[tokio::test]
async fn test_dashboard_weighted_rollup() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/dashboard")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_ok();
    let dashboard: DashboardResponse = response.json();
    assert_eq!(dashboard.team.name, "Growth");
    assert_eq!(dashboard.team.member_count, 1);
    assert_eq!(dashboard.kr_count, 2);
    // 50% at weight 30, 100% at weight 70 → (50*30 + 100*70)/100 = 85
    assert_eq!(dashboard.rollup_percent, 85.0);
    assert_eq!(dashboard.on_track_count, 1);
    assert_eq!(dashboard.bonus_count, 0);
}

#[tokio::test]
async fn test_dashboard_without_team_is_rejected() {
    let server = seeded_server();
    // Root has no team assignment
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .get("/dashboard")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
}

// =============================================================================
// PROVISIONING TESTS
// =============================================================================

#[tokio::test]
async fn test_provision_as_member_is_permission_denied() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "email": "new@example.com", "password": "newpass-123", "name": "New",
            "role": "colaborador", "job_title": "Analista Jr"
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 403);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "permission-denied");
}

#[tokio::test]
async fn test_provision_missing_password_is_invalid_argument() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .post("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "email": "new@example.com", "name": "New",
            "role": "colaborador", "job_title": "Analista Jr"
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "invalid-argument");
    assert!(body.message.contains("password"));
}

#[tokio::test]
async fn test_provision_success_then_new_user_logs_in() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .post("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "email": "carla@example.com", "password": "carlapass-123", "name": "Carla",
            "role": "gestor", "job_title": "Coordenador", "team_id": "t1"
        }))
        .await;

    response.assert_status_ok();
    let result: ProvisionResponse = response.json();
    assert!(result.result.contains("carla@example.com"));

    // The provisioned identity is immediately usable
    let carla_token = login(&server, "carla@example.com", "carlapass-123").await;
    let me = server
        .get("/me")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&carla_token))
        .await;
    let profile: UserProfile = me.json();
    assert_eq!(profile.name, "Carla");
    assert_eq!(profile.role, Role::Gestor);
    assert_eq!(profile.team_id, Some(TeamId::new("t1")));
}

#[tokio::test]
async fn test_provision_updates_member_count() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    server
        .post("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "email": "dan@example.com", "password": "danpass-1234", "name": "Dan",
            "role": "colaborador", "job_title": "Analista Sr", "team_id": "t1"
        }))
        .await
        .assert_status_ok();

    let teams = server
        .get("/teams")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;
    let teams: Vec<Team> = teams.json();
    let t1 = teams.iter().find(|t| t.id == TeamId::new("t1")).unwrap();
    assert_eq!(t1.member_count, 2);
}

#[tokio::test]
async fn test_provision_duplicate_email_is_internal() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .post("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({
            "email": "ana@example.com", "password": "whatever-123", "name": "Ana Again",
            "role": "colaborador", "job_title": "Analista Jr"
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 500);
    let body: ErrorBody = response.json();
    assert_eq!(body.code, "internal");
    assert!(body.message.contains("already in use"));
}

// =============================================================================
// ADMIN USER & TEAM MANAGEMENT TESTS
// =============================================================================

#[tokio::test]
async fn test_list_users_is_admin_only() {
    let server = seeded_server();

    let member_token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;
    let denied = server
        .get("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&member_token))
        .await;
    assert_eq!(denied.status_code().as_u16(), 403);

    let admin_token = login(&server, "root@example.com", ADMIN_PASSWORD).await;
    let allowed = server
        .get("/admin/users")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&admin_token))
        .await;
    allowed.assert_status_ok();
    let users: Vec<UserProfile> = allowed.json();
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_update_user_moves_team_and_recounts() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .patch("/admin/users/u-ana")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "team_id": "t2", "role": "gestor" }))
        .await;

    response.assert_status_ok();
    let updated: UserProfile = response.json();
    assert_eq!(updated.team_id, Some(TeamId::new("t2")));
    assert_eq!(updated.role, Role::Gestor);

    let teams = server
        .get("/teams")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;
    let teams: Vec<Team> = teams.json();
    let t1 = teams.iter().find(|t| t.id == TeamId::new("t1")).unwrap();
    let t2 = teams.iter().find(|t| t.id == TeamId::new("t2")).unwrap();
    assert_eq!(t1.member_count, 0);
    assert_eq!(t2.member_count, 2);
}

#[tokio::test]
async fn test_update_missing_user_is_404() {
    let server = seeded_server();
    let token = login(&server, "root@example.com", ADMIN_PASSWORD).await;

    let response = server
        .patch("/admin/users/ghost")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "Ghost" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn test_create_team_is_admin_only() {
    let server = seeded_server();

    let member_token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;
    let denied = server
        .post("/admin/teams")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&member_token))
        .json(&json!({ "name": "Shadow" }))
        .await;
    assert_eq!(denied.status_code().as_u16(), 403);

    let admin_token = login(&server, "root@example.com", ADMIN_PASSWORD).await;
    let created = server
        .post("/admin/teams")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&admin_token))
        .json(&json!({ "name": "Data" }))
        .await;
    created.assert_status_ok();
    let team: Team = created.json();
    assert_eq!(team.name, "Data");
    assert_eq!(team.member_count, 0);

    let teams = server
        .get("/teams")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&admin_token))
        .await;
    let teams: Vec<Team> = teams.json();
    assert_eq!(teams.len(), 3);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .get("/unknown")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = seeded_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = seeded_server();
    let token = login(&server, "ana@example.com", MEMBER_PASSWORD).await;

    let response = server
        .post("/krs")
        .add_header(axum::http::header::AUTHORIZATION, bearer(&token))
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    // Should return 4xx error for invalid JSON
    assert!(response.status_code().is_client_error());
}
