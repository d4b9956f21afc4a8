//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use metas_core::{
    Account, Directory, MetasError, NewUser, Role, TeamId, UserId, UserProfile, password_digest,
};
use std::path::Path;

// =============================================================================
// DIRECTORY LOADING
// =============================================================================

/// Open the directory for the selected backend.
fn load_or_create_directory(db_path: &Path, backend: &str) -> Result<Directory, MetasError> {
    match backend {
        "memory" => Ok(Directory::new()),
        "redb" => Directory::with_redb(db_path),
        other => Err(MetasError::InvalidArgument(format!(
            "Unknown backend '{other}' (expected redb or memory)"
        ))),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: &str,
    host: &str,
    port: u16,
) -> Result<(), MetasError> {
    let directory = load_or_create_directory(db_path, backend)?;

    println!("Metas OKR Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  POST /auth/login           - Open a session");
    println!("  GET  /krs                  - List visible KRs");
    println!("  POST /krs/{{id}}/checkpoints - Append a checkpoint");
    println!("  GET  /dashboard            - Team rollup");
    println!("  GET  /watch                - Change feed (SSE)");
    println!("  POST /admin/users          - Provision a user");
    println!("  GET  /health               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, directory).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a database with a bootstrap admin.
///
/// This is the only path that writes an identity without going through
/// the provisioner: the provisioner requires an admin caller, and a
/// fresh deployment has none yet.
pub fn cmd_init(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    admin_email: &str,
    admin_password: &str,
    admin_name: &str,
    force: bool,
) -> Result<(), MetasError> {
    let email = admin_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(MetasError::InvalidArgument(format!(
            "'{email}' is not a valid email address"
        )));
    }
    if admin_password.len() < metas_core::constants::MIN_PASSWORD_LENGTH {
        return Err(MetasError::InvalidArgument(format!(
            "Password must be at least {} characters",
            metas_core::constants::MIN_PASSWORD_LENGTH
        )));
    }

    if backend == "redb" && db_path.exists() {
        if !force {
            return Err(MetasError::Conflict(format!(
                "Database {:?} already exists (use --force to re-initialize)",
                db_path
            )));
        }
        std::fs::remove_file(db_path).map_err(|e| MetasError::Io(e.to_string()))?;
    }

    let mut directory = load_or_create_directory(db_path, backend)?;

    let uid = UserId::mint();
    directory.insert_account(Account {
        uid: uid.clone(),
        email: email.to_string(),
        password_hash: password_digest(&uid, admin_password),
    })?;
    directory.put_user(UserProfile {
        id: uid.clone(),
        name: admin_name.trim().to_string(),
        email: email.to_string(),
        role: Role::Admin,
        job_title: None,
        team_id: None,
    })?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "admin_uid": uid.as_str(),
            "admin_email": email,
        });
        println!("{}", output);
    } else {
        println!("Initialized {:?}", db_path);
        println!("Bootstrap admin: {} ({})", email, uid);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store counts.
pub fn cmd_status(db_path: &Path, backend: &str, json_mode: bool) -> Result<(), MetasError> {
    let directory = load_or_create_directory(db_path, backend)?;
    let counts = directory.counts()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "users": counts.users,
            "teams": counts.teams,
            "krs": counts.krs,
        });
        println!("{}", output);
    } else {
        println!("Database: {:?} ({})", db_path, backend);
        println!("  Users: {}", counts.users);
        println!("  Teams: {}", counts.teams);
        println!("  KRs:   {}", counts.krs);
    }
    Ok(())
}

// =============================================================================
// ROLLUP COMMAND
// =============================================================================

/// Print a team's per-KR progress and weighted rollup.
pub fn cmd_rollup(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    team: &str,
) -> Result<(), MetasError> {
    use metas_core::{classify, current_value, percentage, weighted_rollup};

    let directory = load_or_create_directory(db_path, backend)?;
    let team_id = TeamId::new(team.trim());
    let team_doc = directory
        .get_team(&team_id)?
        .ok_or_else(|| MetasError::NotFound(format!("Team '{team_id}' does not exist")))?;
    let krs = directory.krs_for_team(&team_id)?;
    let rollup = weighted_rollup(&krs);

    if json_mode {
        let rows: Vec<serde_json::Value> = krs
            .iter()
            .map(|kr| {
                let pct = percentage(kr);
                let class = classify(pct);
                serde_json::json!({
                    "id": kr.id.as_str(),
                    "name": kr.name,
                    "current_value": current_value(kr),
                    "target_value": kr.target_value,
                    "weight": kr.weight,
                    "percentage": pct,
                    "on_track": class.on_track,
                    "bonus": class.bonus,
                })
            })
            .collect();
        let output = serde_json::json!({
            "team": team_doc.name,
            "rollup_percent": rollup,
            "krs": rows,
        });
        println!("{}", output);
    } else {
        println!("Team: {} ({} members)", team_doc.name, team_doc.member_count);
        println!();
        for kr in &krs {
            let pct = percentage(kr);
            let class = classify(pct);
            let marker = if class.bonus {
                "bonus"
            } else if class.on_track {
                "on track"
            } else {
                "behind"
            };
            println!(
                "  {:<40} {:>8.0}%  ({:.0}/{:.0} {}, weight {:.0}) [{}]",
                kr.name, pct, current_value(kr), kr.target_value, kr.unit, kr.weight, marker
            );
        }
        println!();
        println!("Weighted rollup: {:.1}%", rollup);
    }
    Ok(())
}

// =============================================================================
// PROVISION COMMAND
// =============================================================================

/// Fields for a CLI provisioning call.
#[derive(Debug)]
pub struct ProvisionArgs {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
    pub job_title: String,
    pub team: Option<String>,
}

/// Provision a user; the actor email must resolve to an admin profile.
pub fn cmd_provision(
    db_path: &Path,
    backend: &str,
    json_mode: bool,
    actor_email: &str,
    args: ProvisionArgs,
) -> Result<(), MetasError> {
    let mut directory = load_or_create_directory(db_path, backend)?;

    let actor_account = directory.get_account(actor_email.trim())?.ok_or_else(|| {
        MetasError::Unauthenticated(format!("No account for actor '{actor_email}'"))
    })?;
    let actor = directory.get_user(&actor_account.uid)?.ok_or_else(|| {
        MetasError::Unauthenticated(format!("Actor '{actor_email}' has no profile"))
    })?;

    let request = NewUser {
        email: args.email.trim().to_string(),
        password: args.password,
        name: args.name,
        role: args.role.parse::<Role>()?,
        job_title: args.job_title,
        team_id: args.team.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(TeamId::new),
    };

    let receipt = directory.provision_user(&actor, &request)?;

    if json_mode {
        let output = serde_json::json!({
            "uid": receipt.uid.as_str(),
            "result": receipt.message,
        });
        println!("{}", output);
    } else {
        println!("{}", receipt.message);
        println!("uid: {}", receipt.uid);
    }
    Ok(())
}
