//! Share token issuance and verification
//!
//! A share token is a compact HS256 JWT carrying the batch's original
//! filenames and an expiry. The serialized token doubles as the name of the
//! storage partition holding the files, so this module never touches the
//! filesystem; it only signs and verifies.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in a share token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareClaims {
    /// Original filenames of the batch, in upload order.
    pub files: Vec<String>,
    /// Unix timestamp of issuance.
    pub iat: i64,
    /// Unix timestamp after which the token is invalid.
    pub exp: i64,
}

impl ShareClaims {
    /// Expiry as a timestamp, `None` if `exp` is out of the representable range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly issued token together with its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Serialized token, usable verbatim as a partition name.
    pub token: String,
    pub claims: ShareClaims,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The string does not parse as a token at all.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The token parses but was not signed with the current secret.
    #[error("Token signature mismatch")]
    SignatureMismatch,

    /// The token is authentic but its expiry has passed.
    #[error("Token expired at {expired_at}")]
    Expired { expired_at: i64 },

    #[error("Token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies signed, self-expiring share tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl,
        }
    }

    /// Issue a token for a batch of filenames using the default lifetime.
    pub fn issue(&self, files: Vec<String>) -> Result<IssuedToken, TokenError> {
        self.issue_with_ttl(files, self.default_ttl)
    }

    /// Issue a token expiring `ttl` from now. A zero ttl yields a token that
    /// is already expired; verification will report it as such.
    pub fn issue_with_ttl(
        &self,
        files: Vec<String>,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        // exp carries whole seconds, so surface that exact instant; keeping
        // the sub-second part would overstate the lifetime by up to 999ms.
        let expires_at = (now + ttl).trunc_subsecs(0);
        let claims = ShareClaims {
            files,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token =
            encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            claims,
            expires_at,
        })
    }

    /// Check a raw token's signature and expiry against wall-clock time.
    ///
    /// The three failure kinds stay distinguishable so the garbage collector
    /// can account for routine expiry separately from forged or corrupted
    /// names; callers that only need "is this still usable" treat any error
    /// as invalid.
    pub fn verify(&self, raw: &str) -> Result<ShareClaims, TokenError> {
        // Expiry is checked manually below. The library default tolerates 60
        // seconds of clock leeway, which would keep a zero-ttl token alive.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<ShareClaims>(raw, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("share token verification failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        Ok(claims)
    }
}
