use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "MedIntake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Signing secret used when `JWT_SECRET` is not configured. Never use in production.
pub const DEV_JWT_SECRET: &str = "default_secret_change_in_production";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const DEFAULT_TOKEN_EXPIRATION_HOURS: i64 = 72;
/// Upper bound for any configured lifetime: ten years.
const MAX_LIFETIME_HOURS: i64 = 24 * 365 * 10;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:4200";

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medintake=info,medintake_lib=info,tower_http=info"
}

/// Get the application data directory
/// ~/MedIntake/ when a home directory exists, the working directory otherwise.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default database file location.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("medintake.db")
}

/// Default directory for the local vault.
pub fn default_vault_dir() -> PathBuf {
    app_data_dir().join("vault")
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Credentials for the optional first-run admin.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub token_expiration: Duration,
    pub frontend_url: String,
    pub listen_addr: SocketAddr,
    pub static_dir: Option<PathBuf>,
    pub sweep_interval_secs: u64,
    pub password_iterations: u32,
    pub auto_seed_admin: bool,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let session_ttl = parse_hours("SESSION_TTL_HOURS", get("SESSION_TTL_HOURS"), DEFAULT_SESSION_TTL_HOURS)?;
        let token_expiration = parse_hours(
            "TOKEN_EXPIRATION_HOURS",
            get("TOKEN_EXPIRATION_HOURS"),
            DEFAULT_TOKEN_EXPIRATION_HOURS,
        )?;

        let host: IpAddr = parse_or("HOST", get("HOST"), IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port: u16 = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        let password_iterations = parse_or(
            "PASSWORD_HASH_ITERATIONS",
            get("PASSWORD_HASH_ITERATIONS"),
            crate::crypto::PBKDF2_ITERATIONS,
        )?;
        if password_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PASSWORD_HASH_ITERATIONS",
                value: "0".into(),
            });
        }

        let auto_seed_admin = get("AUTO_SEED_ADMIN").as_deref() == Some("true");
        let seed_admin = match (get("DEFAULT_ADMIN_USER"), lookup("DEFAULT_ADMIN_PASS")) {
            (Some(username), Some(password)) if !password.is_empty() => Some(SeedAdmin {
                username,
                password,
                email: get("DEFAULT_ADMIN_EMAIL"),
            }),
            _ => None,
        };

        Ok(Self {
            database_path,
            jwt_secret,
            session_ttl,
            token_expiration,
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            listen_addr: SocketAddr::new(host, port),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            sweep_interval_secs: parse_or(
                "TOKEN_SWEEP_INTERVAL_SECS",
                get("TOKEN_SWEEP_INTERVAL_SECS"),
                DEFAULT_SWEEP_INTERVAL_SECS,
            )?,
            password_iterations,
            auto_seed_admin,
            seed_admin,
        })
    }

    /// Whether the signing secret is the built-in development value.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

/// Parse a lifetime in whole hours, within `1..=MAX_LIFETIME_HOURS`.
fn parse_hours(key: &'static str, raw: Option<String>, default: i64) -> Result<Duration, ConfigError> {
    let hours = parse_or(key, raw, default)?;
    match Duration::try_hours(hours) {
        Some(lifetime) if (1..=MAX_LIFETIME_HOURS).contains(&hours) => Ok(lifetime),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: hours.to_string(),
        }),
    }
}
