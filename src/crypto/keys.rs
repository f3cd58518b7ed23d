use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use super::CryptoError;
use super::encryption::EncryptedData;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
pub const KEY_LENGTH: usize = 32; // AES-256
pub const SALT_LENGTH: usize = 16;

/// Record-encryption key for one vault user, zeroed on drop.
///
/// Derived from the user's password, never from the username.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    pub(super) key_bytes: [u8; KEY_LENGTH],
}

impl VaultKey {
    /// Derive from password + salt using PBKDF2-SHA256
    pub fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let mut key_bytes = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key_bytes);
        Self { key_bytes }
    }

    /// Encrypt data using AES-256-GCM
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData, CryptoError> {
        EncryptedData::encrypt(&self.key_bytes, plaintext)
    }

    /// Decrypt data using AES-256-GCM
    pub fn decrypt(&self, encrypted: &EncryptedData) -> Result<Vec<u8>, CryptoError> {
        encrypted.decrypt(&self.key_bytes)
    }
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn same_password_salt_and_iterations_reopen_the_vault() {
        let salt = generate_salt();
        let sealed = VaultKey::derive("clave-segura", &salt, FAST)
            .encrypt(b"{\"nombre\":\"Ana\"}")
            .unwrap();
        let reopened = VaultKey::derive("clave-segura", &salt, FAST);
        assert_eq!(reopened.decrypt(&sealed).unwrap(), b"{\"nombre\":\"Ana\"}");
    }

    #[test]
    fn iteration_count_is_part_of_the_key() {
        let salt = [7u8; SALT_LENGTH];
        let fast = VaultKey::derive("clave-segura", &salt, FAST);
        let slower = VaultKey::derive("clave-segura", &salt, FAST + 1);
        assert_ne!(fast.key_bytes, slower.key_bytes);

        let sealed = fast.encrypt(b"record").unwrap();
        assert!(matches!(slower.decrypt(&sealed), Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn per_user_salt_separates_identical_passwords() {
        let (salt_a, salt_b) = (generate_salt(), generate_salt());
        assert_eq!(salt_a.len(), SALT_LENGTH);
        assert_ne!(salt_a, salt_b);

        let sealed = VaultKey::derive("shared", &salt_a, FAST).encrypt(b"record").unwrap();
        assert!(VaultKey::derive("shared", &salt_b, FAST).decrypt(&sealed).is_err());
    }
}
