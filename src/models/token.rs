use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TokenStatus;

/// Single-use link credential for the public form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormToken {
    pub id: Uuid,
    pub token: String,
    pub status: TokenStatus,
    /// Set for edit links; `None` means the submission creates a record.
    pub record_id: Option<Uuid>,
    pub generated_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of checking whether a token may still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidity {
    Valid,
    AlreadyUsed,
    Expired,
}

impl FormToken {
    pub fn is_edit(&self) -> bool {
        self.record_id.is_some()
    }

    /// Pure check: the token is expired, or pending with its deadline reached.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            TokenStatus::Expired => true,
            TokenStatus::Submitted => false,
            TokenStatus::Pending => self.expires_at.is_some_and(|deadline| deadline <= now),
        }
    }

    /// Pure validity check. Never mutates the token.
    pub fn validity(&self, now: DateTime<Utc>) -> TokenValidity {
        match self.status {
            TokenStatus::Submitted => TokenValidity::AlreadyUsed,
            TokenStatus::Expired => TokenValidity::Expired,
            TokenStatus::Pending if self.is_expired(now) => TokenValidity::Expired,
            TokenStatus::Pending => TokenValidity::Valid,
        }
    }
}

/// Token row joined with display names for the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    #[serde(flatten)]
    pub token: FormToken,
    pub record_nombre: Option<String>,
    pub generated_by_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(status: TokenStatus, expires_at: Option<DateTime<Utc>>) -> FormToken {
        let now = Utc::now();
        FormToken {
            id: Uuid::new_v4(),
            token: "a".repeat(21),
            status,
            record_id: None,
            generated_by: Uuid::new_v4(),
            expires_at,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_without_deadline_is_valid() {
        let t = token(TokenStatus::Pending, None);
        assert_eq!(t.validity(Utc::now()), TokenValidity::Valid);
        assert!(!t.is_expired(Utc::now()));
    }

    #[test]
    fn pending_past_deadline_reads_expired_without_mutation() {
        let now = Utc::now();
        let t = token(TokenStatus::Pending, Some(now - Duration::minutes(1)));
        assert!(t.is_expired(now));
        assert_eq!(t.validity(now), TokenValidity::Expired);
        assert_eq!(t.status, TokenStatus::Pending);
    }

    #[test]
    fn pending_before_deadline_is_valid() {
        let now = Utc::now();
        let t = token(TokenStatus::Pending, Some(now + Duration::hours(1)));
        assert_eq!(t.validity(now), TokenValidity::Valid);
    }

    #[test]
    fn terminal_states_are_never_valid() {
        let now = Utc::now();
        assert_eq!(token(TokenStatus::Submitted, None).validity(now), TokenValidity::AlreadyUsed);
        assert_eq!(token(TokenStatus::Expired, None).validity(now), TokenValidity::Expired);
        // A submitted token stays "used" even after its deadline passes.
        let used = token(TokenStatus::Submitted, Some(now - Duration::days(1)));
        assert_eq!(used.validity(now), TokenValidity::AlreadyUsed);
        assert!(!used.is_expired(now));
    }
}
