//! Signed session tokens.
//!
//! Tokens are HS256 JWTs signed with one secret for the whole gateway. The
//! tenant is carried inside the claims, not in the key.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, TokenError};
use crate::models::{Role, User};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Verified identity carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
    #[serde(rename = "iat")]
    pub issued_at: u64,
    #[serde(rename = "nbf")]
    pub not_before: u64,
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

impl Claims {
    /// Claims for `user`, valid from `now` (Unix seconds) for `ttl`.
    pub fn for_user(user: &User, now: u64, ttl: Duration) -> Self {
        Self {
            user_id: user.id.clone(),
            tenant_id: user.tenant_id.clone(),
            role: user.role,
            issued_at: now,
            not_before: now,
            expires_at: now + ttl.as_secs(),
        }
    }

    /// Fails with [`AuthError::TenantMismatch`] unless the token was issued for
    /// `tenant_id`.
    pub fn ensure_tenant(&self, tenant_id: &str) -> Result<(), AuthError> {
        if self.tenant_id == tenant_id {
            Ok(())
        } else {
            Err(AuthError::TenantMismatch)
        }
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::try_from(self.expires_at).ok()?, 0)
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and validates session tokens.
///
/// Validation is pinned to HS256: the `alg` header of an incoming token is
/// never used to pick the verification method, and tokens with a different
/// or missing algorithm are rejected.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Signs a token for `user` that stays valid for `ttl` from now.
    pub fn issue(&self, user: &User, ttl: Duration) -> Result<IssuedToken, TokenError> {
        let claims = Claims::for_user(user, now_secs()?, ttl);
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verifies signature and validity window and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = classify(e.kind());
                tracing::debug!("Token rejected: {reason}");
                reason
            })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        other => TokenError::Malformed(format!("{other:?}")),
    }
}

fn now_secs() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TokenError::Signing(format!("system clock before epoch: {e}")))
}
