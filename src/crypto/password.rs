use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;
use super::keys::{generate_salt, KEY_LENGTH};

const HASH_SCHEME: &str = "pbkdf2-sha256";

/// Hash a password for storage.
///
/// Format: `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = generate_salt();
    let hash = derive(password, &salt, iterations);
    format!(
        "{HASH_SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Check a candidate password against a stored hash in constant time.
/// Malformed stored hashes never verify.
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    let Ok(parsed) = ParsedHash::parse(stored) else {
        return false;
    };
    let computed = derive(candidate, &parsed.salt, parsed.iterations);
    computed.ct_eq(parsed.hash.as_slice()).into()
}

/// Burn the same work as a real verification so unknown usernames
/// cannot be told apart from wrong passwords by timing.
pub fn dummy_verify(candidate: &str, iterations: u32) {
    let _ = derive(candidate, &[0u8; 16], iterations);
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> Result<Self, CryptoError> {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) =
            (parts.next(), parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedHash);
        };
        if scheme != HASH_SCHEME {
            return Err(CryptoError::MalformedHash);
        }

        let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
        if iterations == 0 {
            return Err(CryptoError::MalformedHash);
        }
        let salt = STANDARD_NO_PAD.decode(salt).map_err(|_| CryptoError::MalformedHash)?;
        let hash = STANDARD_NO_PAD.decode(hash).map_err(|_| CryptoError::MalformedHash)?;
        if hash.len() != KEY_LENGTH {
            return Err(CryptoError::MalformedHash);
        }

        Ok(Self { iterations, salt, hash })
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LENGTH] {
    let mut out = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}
