//! Admin accounts: provisioning, first-run seeding, and login.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::crypto::{self, CryptoError};
use crate::db::{self, DatabaseError};
use crate::models::{Admin, AdminProfile};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username must be at least {MIN_USERNAME_LEN} characters")]
    UsernameTooShort,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Admin '{0}' already exists")]
    UsernameTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result of `create_or_update_admin`.
#[derive(Debug)]
pub enum Provisioned {
    Created(Admin),
    Updated(Admin),
    /// Username exists and updating was not requested.
    Unchanged(Admin),
}

/// Successful login: a signed session plus the public admin profile.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub admin: AdminProfile,
}

/// Create a new admin. Fails with `UsernameTaken` if the name is in use.
pub fn create_admin(
    conn: &Connection,
    username: &str,
    password: &str,
    email: Option<&str>,
    iterations: u32,
    now: DateTime<Utc>,
) -> Result<Admin, AccountError> {
    let username = check_credentials(username, password)?;
    let admin = Admin {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: crypto::hash_password(password, iterations),
        email: normalize_email(email),
        created_at: now,
        updated_at: now,
    };

    db::insert_admin(conn, &admin).map_err(|e| {
        if e.is_unique_violation() {
            AccountError::UsernameTaken(admin.username.clone())
        } else {
            e.into()
        }
    })?;
    tracing::info!(admin_id = %admin.id, username = %admin.username, "Admin created");
    Ok(admin)
}

/// Create an admin, or when it already exists and `update` is set, replace
/// its password (and email when given).
pub fn create_or_update_admin(
    conn: &Connection,
    username: &str,
    password: &str,
    email: Option<&str>,
    update: bool,
    iterations: u32,
    now: DateTime<Utc>,
) -> Result<Provisioned, AccountError> {
    let trimmed = check_credentials(username, password)?;
    let Some(existing) = db::get_admin_by_username(conn, trimmed)? else {
        return create_admin(conn, trimmed, password, email, iterations, now).map(Provisioned::Created);
    };
    if !update {
        return Ok(Provisioned::Unchanged(existing));
    }

    let hash = crypto::hash_password(password, iterations);
    let email = normalize_email(email);
    db::update_admin_credentials(conn, &existing.id, &hash, email.as_deref())?;
    tracing::info!(admin_id = %existing.id, "Admin credentials updated");

    let admin = db::get_admin_by_username(conn, trimmed)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "admin".into(),
        id: existing.id.to_string(),
    })?;
    Ok(Provisioned::Updated(admin))
}

/// First-run seeding. Only acts when enabled, credentials are configured,
/// and no admin exists yet. Returns the created admin, if any.
pub fn seed_default_admin(
    conn: &Connection,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<Option<Admin>, AccountError> {
    if !config.auto_seed_admin {
        return Ok(None);
    }
    let Some(seed) = &config.seed_admin else {
        tracing::warn!("AUTO_SEED_ADMIN set without DEFAULT_ADMIN_USER/DEFAULT_ADMIN_PASS, skipping");
        return Ok(None);
    };
    if db::count_admins(conn)? > 0 {
        return Ok(None);
    }

    let admin = create_admin(
        conn,
        &seed.username,
        &seed.password,
        seed.email.as_deref(),
        config.password_iterations,
        now,
    )?;
    tracing::info!(username = %admin.username, "Seeded default admin");
    Ok(Some(admin))
}

/// Verify credentials and issue a session.
///
/// Unknown usernames and wrong passwords fail identically, and both pay for
/// one password derivation.
pub fn authenticate(
    conn: &Connection,
    username: &str,
    password: &str,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<LoginSession, AccountError> {
    let admin = match db::get_admin_by_username(conn, username.trim())? {
        Some(admin) if crypto::verify_password(password, &admin.password_hash) => admin,
        Some(_) => {
            tracing::warn!("Admin login failed");
            return Err(AccountError::InvalidCredentials);
        }
        None => {
            crypto::dummy_verify(password, config.password_iterations);
            tracing::warn!("Admin login failed");
            return Err(AccountError::InvalidCredentials);
        }
    };

    let token = crypto::issue_session(
        config.jwt_secret.as_bytes(),
        admin.id,
        &admin.username,
        config.session_ttl,
        now,
    )?;
    tracing::info!(admin_id = %admin.id, "Admin logged in");
    Ok(LoginSession {
        token,
        admin: AdminProfile::from(&admin),
    })
}

fn check_credentials<'a>(username: &'a str, password: &str) -> Result<&'a str, AccountError> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AccountError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }
    Ok(username)
}

fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedAdmin;
    use crate::db::open_memory_database;
    use std::collections::HashMap;

    const FAST: u32 = 1_000;

    fn test_config(pairs: &[(&str, &str)]) -> AppConfig {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.insert("PASSWORD_HASH_ITERATIONS".into(), FAST.to_string());
        map.insert("JWT_SECRET".into(), "accounts-test-secret".into());
        AppConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    #[test]
    fn create_admin_normalizes_fields() {
        let conn = open_memory_database().unwrap();
        let admin = create_admin(&conn, "  nurse  ", "secret1", Some(" Nurse@Clinic.ORG "), FAST, Utc::now()).unwrap();
        assert_eq!(admin.username, "nurse");
        assert_eq!(admin.email.as_deref(), Some("nurse@clinic.org"));
        assert_ne!(admin.password_hash, "secret1");
        assert!(crypto::verify_password("secret1", &admin.password_hash));
    }

    #[test]
    fn create_admin_enforces_minimums() {
        let conn = open_memory_database().unwrap();
        assert!(matches!(
            create_admin(&conn, " ab ", "secret1", None, FAST, Utc::now()),
            Err(AccountError::UsernameTooShort)
        ));
        assert!(matches!(
            create_admin(&conn, "abc", "12345", None, FAST, Utc::now()),
            Err(AccountError::PasswordTooShort)
        ));
        assert_eq!(db::count_admins(&conn).unwrap(), 0);
    }

    #[test]
    fn duplicate_username_reported() {
        let conn = open_memory_database().unwrap();
        create_admin(&conn, "nurse", "secret1", None, FAST, Utc::now()).unwrap();
        assert!(matches!(
            create_admin(&conn, "nurse", "secret2", None, FAST, Utc::now()),
            Err(AccountError::UsernameTaken(name)) if name == "nurse"
        ));
    }

    #[test]
    fn create_or_update_respects_update_flag() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();
        let created = create_or_update_admin(&conn, "nurse", "secret1", None, false, FAST, now).unwrap();
        assert!(matches!(created, Provisioned::Created(_)));

        let unchanged = create_or_update_admin(&conn, "nurse", "secret2", None, false, FAST, now).unwrap();
        match unchanged {
            Provisioned::Unchanged(admin) => assert!(crypto::verify_password("secret1", &admin.password_hash)),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let updated =
            create_or_update_admin(&conn, "nurse", "secret2", Some("n@x.org"), true, FAST, now).unwrap();
        match updated {
            Provisioned::Updated(admin) => {
                assert!(crypto::verify_password("secret2", &admin.password_hash));
                assert_eq!(admin.email.as_deref(), Some("n@x.org"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(db::count_admins(&conn).unwrap(), 1);
    }

    #[test]
    fn seed_runs_only_when_enabled_and_empty() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();

        let disabled = test_config(&[("DEFAULT_ADMIN_USER", "root"), ("DEFAULT_ADMIN_PASS", "hunter22")]);
        assert!(seed_default_admin(&conn, &disabled, now).unwrap().is_none());

        let missing = test_config(&[("AUTO_SEED_ADMIN", "true")]);
        assert!(seed_default_admin(&conn, &missing, now).unwrap().is_none());
        assert_eq!(db::count_admins(&conn).unwrap(), 0);

        let mut enabled = test_config(&[("AUTO_SEED_ADMIN", "true")]);
        enabled.seed_admin = Some(SeedAdmin {
            username: "root".into(),
            password: "hunter22".into(),
            email: None,
        });
        let seeded = seed_default_admin(&conn, &enabled, now).unwrap().unwrap();
        assert_eq!(seeded.username, "root");

        // An admin exists now, so a second start seeds nothing.
        assert!(seed_default_admin(&conn, &enabled, now).unwrap().is_none());
        assert_eq!(db::count_admins(&conn).unwrap(), 1);
    }

    #[test]
    fn authenticate_issues_verifiable_session() {
        let conn = open_memory_database().unwrap();
        let config = test_config(&[]);
        let now = Utc::now();
        let admin = create_admin(&conn, "nurse", "secret1", None, FAST, now).unwrap();

        let session = authenticate(&conn, "nurse", "secret1", &config, now).unwrap();
        assert_eq!(session.admin.id, admin.id);
        let claims = crypto::verify_session(config.jwt_secret.as_bytes(), &session.token, now).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.username, "nurse");
    }

    #[test]
    fn authenticate_failures_are_indistinguishable() {
        let conn = open_memory_database().unwrap();
        let config = test_config(&[]);
        let now = Utc::now();
        create_admin(&conn, "nurse", "secret1", None, FAST, now).unwrap();

        let wrong_password = authenticate(&conn, "nurse", "nope-nope", &config, now).unwrap_err();
        let unknown_user = authenticate(&conn, "ghost", "secret1", &config, now).unwrap_err();
        assert!(matches!(wrong_password, AccountError::InvalidCredentials));
        assert!(matches!(unknown_user, AccountError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
