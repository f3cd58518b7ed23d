//! Signed admin sessions: compact HS256 JWTs.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Fixed header of every issued token (`{"alg":"HS256","typ":"JWT"}`).
const HEADER_B64: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin id.
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a session token for an admin, valid for `ttl` from `now`.
pub fn issue_session(
    secret: &[u8],
    admin_id: Uuid,
    username: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, CryptoError> {
    let expires = now.checked_add_signed(ttl).ok_or(CryptoError::SessionLifetime)?;
    let claims = SessionClaims {
        sub: admin_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: expires.timestamp(),
    };
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let message = format!("{HEADER_B64}.{claims_b64}");
    let signature = sign(secret, message.as_bytes())?.finalize().into_bytes();
    Ok(format!("{message}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Verify signature and expiry of a session token.
pub fn verify_session(secret: &[u8], token: &str, now: DateTime<Utc>) -> Result<SessionClaims, CryptoError> {
    let mut parts = token.split('.');
    let (Some(header), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::InvalidSession);
    };
    if header != HEADER_B64 {
        return Err(CryptoError::InvalidSession);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| CryptoError::InvalidSession)?;
    let mac = sign(secret, format!("{header}.{claims_b64}").as_bytes())?;
    mac.verify_slice(&signature)
        .map_err(|_| CryptoError::InvalidSession)?;

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| CryptoError::InvalidSession)?;
    let claims: SessionClaims =
        serde_json::from_slice(&claims_json).map_err(|_| CryptoError::InvalidSession)?;

    if claims.exp <= now.timestamp() {
        return Err(CryptoError::SessionExpired);
    }
    Ok(claims)
}

fn sign(secret: &[u8], message: &[u8]) -> Result<HmacSha256, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| CryptoError::SigningKey)?;
    mac.update(message);
    Ok(mac)
}
