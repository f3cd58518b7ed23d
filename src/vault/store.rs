use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VaultError;
use crate::accounts::{MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::crypto::{self, EncryptedData, VaultKey};
use crate::models::RecordFields;

/// Vault sessions end this long after login.
pub const SESSION_TTL_HOURS: i64 = 24;

const USERS_FILE: &str = "users.json";
const RECORDS_DIR: &str = "records";

/// A locally registered vault user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaultUser {
    id: Uuid,
    username: String,
    password_hash: String,
    /// Salt for the record key, base64. Distinct from the password hash salt.
    key_salt: String,
    created_at: DateTime<Utc>,
}

/// One saved form in the vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub id: Uuid,
    pub data: RecordFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unlocked vault for one user. Holds the record key; zeroed on drop.
pub struct VaultSession {
    user_id: Uuid,
    username: String,
    key: VaultKey,
    started_at: DateTime<Utc>,
}

impl VaultSession {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.started_at > Duration::hours(SESSION_TTL_HOURS)
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("username", &self.username)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Directory-backed store: a user list plus one encrypted record file per user.
pub struct LocalVault {
    dir: PathBuf,
    iterations: u32,
}

impl LocalVault {
    /// Open (creating if needed) a vault directory.
    pub fn open(dir: &Path, iterations: u32) -> Result<Self, VaultError> {
        fs::create_dir_all(dir.join(RECORDS_DIR))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            iterations,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register a new user. Usernames are trimmed; passwords are not.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VaultError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() || confirmation.is_empty() {
            return Err(VaultError::MissingFields);
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(VaultError::UsernameTooShort);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::PasswordTooShort);
        }
        if password != confirmation {
            return Err(VaultError::PasswordMismatch);
        }

        let mut users = self.load_users()?;
        if users.iter().any(|u| u.username == username) {
            return Err(VaultError::UserExists);
        }

        users.push(VaultUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: crypto::hash_password(password, self.iterations),
            key_salt: STANDARD.encode(crypto::generate_salt()),
            created_at: now,
        });
        self.save_users(&users)?;
        tracing::info!(username, "Vault user registered");
        Ok(())
    }

    /// Unlock the vault for a user. One generic error for every failure.
    pub fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> Result<VaultSession, VaultError> {
        let username = username.trim();
        let users = self.load_users()?;
        let Some(user) = users.iter().find(|u| u.username == username) else {
            crypto::dummy_verify(password, self.iterations);
            return Err(VaultError::InvalidCredentials);
        };
        if !crypto::verify_password(password, &user.password_hash) {
            return Err(VaultError::InvalidCredentials);
        }

        let salt = STANDARD
            .decode(&user.key_salt)
            .map_err(|_| VaultError::Corrupted("key salt".into()))?;
        Ok(VaultSession {
            user_id: user.id,
            username: user.username.clone(),
            key: VaultKey::derive(password, &salt, self.iterations),
            started_at: now,
        })
    }

    /// Registered usernames, in registration order.
    pub fn usernames(&self) -> Result<Vec<String>, VaultError> {
        Ok(self.load_users()?.into_iter().map(|u| u.username).collect())
    }

    pub fn list_records(&self, session: &VaultSession, now: DateTime<Utc>) -> Result<Vec<VaultRecord>, VaultError> {
        check_session(session, now)?;
        self.load_records(session)
    }

    pub fn get_record(&self, session: &VaultSession, id: &Uuid, now: DateTime<Utc>) -> Result<VaultRecord, VaultError> {
        check_session(session, now)?;
        self.load_records(session)?
            .into_iter()
            .find(|r| &r.id == id)
            .ok_or(VaultError::RecordNotFound)
    }

    /// Create (`id = None`) or overwrite a record.
    pub fn save_record(
        &self,
        session: &VaultSession,
        id: Option<Uuid>,
        data: RecordFields,
        now: DateTime<Utc>,
    ) -> Result<VaultRecord, VaultError> {
        check_session(session, now)?;
        let mut records = self.load_records(session)?;

        let saved = match id {
            Some(id) => {
                let record = records
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(VaultError::RecordNotFound)?;
                record.data = data;
                record.updated_at = now;
                record.clone()
            }
            None => {
                let record = VaultRecord {
                    id: Uuid::new_v4(),
                    data,
                    created_at: now,
                    updated_at: now,
                };
                records.push(record.clone());
                record
            }
        };

        self.store_records(session, &records)?;
        Ok(saved)
    }

    pub fn delete_record(&self, session: &VaultSession, id: &Uuid, now: DateTime<Utc>) -> Result<(), VaultError> {
        check_session(session, now)?;
        let mut records = self.load_records(session)?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(VaultError::RecordNotFound);
        }
        self.store_records(session, &records)
    }

    fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    fn records_path(&self, user_id: &Uuid) -> PathBuf {
        self.dir.join(RECORDS_DIR).join(format!("{user_id}.enc"))
    }

    fn load_users(&self) -> Result<Vec<VaultUser>, VaultError> {
        match fs::read(self.users_path()) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_users(&self, users: &[VaultUser]) -> Result<(), VaultError> {
        write_atomic(&self.users_path(), &serde_json::to_vec_pretty(users)?)
    }

    fn load_records(&self, session: &VaultSession) -> Result<Vec<VaultRecord>, VaultError> {
        let text = match fs::read_to_string(self.records_path(&session.user_id)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let encrypted = EncryptedData::from_base64(&text)?;
        let plaintext = session.key.decrypt(&encrypted)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn store_records(&self, session: &VaultSession, records: &[VaultRecord]) -> Result<(), VaultError> {
        let plaintext = serde_json::to_vec(records)?;
        let encrypted = session.key.encrypt(&plaintext)?;
        write_atomic(&self.records_path(&session.user_id), encrypted.to_base64().as_bytes())
    }
}

fn check_session(session: &VaultSession, now: DateTime<Utc>) -> Result<(), VaultError> {
    if session.is_expired(now) {
        return Err(VaultError::SessionExpired);
    }
    Ok(())
}

/// Write via a sibling temp file and rename, so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), VaultError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
