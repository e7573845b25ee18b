//! HS256 bearer-token verification.

use std::collections::HashSet;

use jwt_simple::prelude::*;
use laurel_application::CredentialVerifier;
use laurel_core::{AppError, AppResult, UserIdentity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum accepted length of the shared signing secret.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Issuer stamped into and required on every token.
pub const TOKEN_ISSUER: &str = "laurel";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityClaims {
    username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permissions: Option<Vec<String>>,
}

/// Verifies HS256 JWTs carrying `username`, `role_id` and `permissions` claims.
#[derive(Clone)]
pub struct JwtCredentialVerifier {
    key: HS256Key,
}

impl JwtCredentialVerifier {
    /// Creates a verifier from the shared secret.
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        Ok(Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
        })
    }

    /// Signs a token for the identity, valid for `valid_for_seconds`.
    ///
    /// Used by tooling and tests; the service itself only verifies.
    pub fn issue(&self, identity: &UserIdentity, valid_for_seconds: u64) -> AppResult<String> {
        let custom = IdentityClaims {
            username: identity.username().to_owned(),
            role_id: identity.role_id().map(str::to_owned),
            permissions: identity.embedded_permissions().map(<[String]>::to_vec),
        };
        let claims = Claims::with_custom_claims(custom, Duration::from_secs(valid_for_seconds))
            .with_subject(identity.subject())
            .with_issuer(TOKEN_ISSUER);

        self.key
            .authenticate(claims)
            .map_err(|error| AppError::Internal(format!("failed to sign token: {error}")))
    }
}

impl CredentialVerifier for JwtCredentialVerifier {
    fn verify(&self, token: &str) -> AppResult<UserIdentity> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from([TOKEN_ISSUER.to_owned()])),
            ..VerificationOptions::default()
        };

        let claims = self
            .key
            .verify_token::<IdentityClaims>(token, Some(options))
            .map_err(|error| {
                debug!(error = %error, "bearer token rejected");
                AppError::Unauthorized("invalid or expired token".to_owned())
            })?;

        let subject = claims
            .subject
            .filter(|subject| !subject.trim().is_empty())
            .ok_or_else(|| AppError::Unauthorized("token has no subject".to_owned()))?;

        Ok(UserIdentity::new(
            subject,
            claims.custom.username,
            claims.custom.role_id,
            claims.custom.permissions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use laurel_application::CredentialVerifier;
    use laurel_core::{AppError, UserIdentity};

    use super::JwtCredentialVerifier;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn short_secret_is_rejected() {
        assert!(matches!(
            JwtCredentialVerifier::new("short"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let verifier = JwtCredentialVerifier::new(SECRET).unwrap_or_else(|_| unreachable!());
        let identity = UserIdentity::new(
            "5f0c3a52-4bb8-4d3e-9f0a-6f1e3f8d2a10",
            "rina",
            Some("3a1b6a3e-7f51-4a8e-9a52-2b7c3f6d9e01".to_owned()),
            Some(vec!["achievements.create".to_owned()]),
        );

        let token = verifier.issue(&identity, 60).unwrap_or_default();
        let verified = verifier.verify(&token);

        assert_eq!(verified.ok(), Some(identity));
    }

    #[test]
    fn token_signed_with_other_secret_is_unauthorized() {
        let issuer = JwtCredentialVerifier::new("ffffffffffffffffffffffffffffffff")
            .unwrap_or_else(|_| unreachable!());
        let verifier = JwtCredentialVerifier::new(SECRET).unwrap_or_else(|_| unreachable!());
        let token = issuer
            .issue(&UserIdentity::new("subject", "user", None, None), 60)
            .unwrap_or_default();

        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verifier.verify("not.a.jwt"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
