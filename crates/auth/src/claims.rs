use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tracker_core::BranchId;

use crate::{PrincipalId, Role};

/// Claims carried by a bearer token once its signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: PrincipalId,

    /// Branch the caller acts for. Every read and write is scoped to it.
    pub branch_id: BranchId,

    pub roles: Vec<Role>,

    /// Display name used when recording who reported a delay or overrun.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    /// Name to attribute actions to; falls back to the subject id.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.sub.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed or unsigned token: {0}")]
    Malformed(String),
}

/// Check the validity window of already-decoded claims.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            branch_id: BranchId::new(),
            roles: vec![Role::new("clerk")],
            name: None,
            issued_at,
            expires_at,
        }
    }

    #[test]
    fn window_checks() {
        let now = Utc::now();
        assert!(validate_claims(&claims(now, now + Duration::minutes(5)), now).is_ok());
        assert_eq!(
            validate_claims(&claims(now, now), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
        assert_eq!(
            validate_claims(&claims(now + Duration::minutes(1), now + Duration::minutes(5)), now),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(
            validate_claims(&claims(now - Duration::minutes(5), now), now),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn display_name_falls_back_to_subject() {
        let now = Utc::now();
        let mut c = claims(now, now + Duration::minutes(5));
        assert_eq!(c.display_name(), c.sub.to_string());
        c.name = Some("  Amina ".into());
        assert_eq!(c.display_name(), "Amina");
    }
}
