//! Token issuance and verification.
//!
//! Dual-token scheme: short-lived access tokens (15 minutes, stateless) and
//! long-lived refresh tokens (10 days, mirrored into the user record so they
//! can be rotated and revoked). Each kind is signed with its own secret;
//! rotating a secret invalidates every outstanding token of that kind only.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token kind for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived access token (15 minutes) - stateless
    Access,
    /// Long-lived refresh token (10 days) - stored on the user record
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token duration: 10 days
pub const REFRESH_TOKEN_TTL_SECS: i64 = 10 * 24 * 60 * 60;

/// A freshly issued token with its timestamps.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

/// Codec for both token kinds.
///
/// Secrets are injected at construction; nothing here reads the environment.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenCodec {
    /// Create a codec with one secret per token kind.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }

    /// Issue a token with the kind's default TTL.
    pub fn issue(&self, subject: &str, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        let ttl = match kind {
            TokenKind::Access => ACCESS_TOKEN_TTL_SECS,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_SECS,
        };
        self.issue_with_ttl(subject, kind, ttl)
    }

    /// Issue a token with an explicit TTL in seconds.
    /// A negative TTL produces an already-expired token.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl_secs: i64,
    ) -> Result<IssuedToken, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::TimeError)?
            .as_secs();

        let exp = now.saturating_add_signed(ttl_secs);

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, self.encoding_key(kind))
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Verify a token against the given kind's secret.
    ///
    /// Expiry and signature failures are distinct error kinds: an expired
    /// token means the caller should refresh, anything else means re-login.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, self.decoding_key(kind), &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidSignature,
            })?;

        if token_data.claims.kind != kind {
            return Err(TokenError::WrongKind);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during token operations.
#[derive(Debug)]
pub enum TokenError {
    /// Signature checks out but the token is past its expiry
    Expired,
    /// Bad signature or malformed token
    InvalidSignature,
    /// Valid token of the other kind (e.g., refresh token used as access)
    WrongKind,
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::WrongKind => write!(f, "Wrong token kind"),
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(
            b"access-secret-for-testing-only!!",
            b"refresh-secret-for-testing-only!",
        )
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let codec = test_codec();

        let issued = codec.issue("uuid-123", TokenKind::Access).unwrap();
        assert_eq!(
            issued.expires_at - issued.issued_at,
            ACCESS_TOKEN_TTL_SECS as u64
        );

        let claims = codec.verify(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn test_issue_and_verify_refresh_token() {
        let codec = test_codec();

        let issued = codec.issue("uuid-123", TokenKind::Refresh).unwrap();
        assert_eq!(
            issued.expires_at - issued.issued_at,
            REFRESH_TOKEN_TTL_SECS as u64
        );

        let claims = codec.verify(&issued.token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_expired_token_is_distinct_from_invalid() {
        let codec = test_codec();

        let expired = codec
            .issue_with_ttl("uuid-123", TokenKind::Access, -1)
            .unwrap();
        assert!(matches!(
            codec.verify(&expired.token, TokenKind::Access),
            Err(TokenError::Expired)
        ));

        let other = TokenCodec::new(
            b"a-completely-different-secret!!!",
            b"refresh-secret-for-testing-only!",
        );
        let foreign = other.issue("uuid-123", TokenKind::Access).unwrap();
        assert!(matches!(
            codec.verify(&foreign.token, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_cross_kind_verification_fails() {
        let codec = test_codec();

        let access = codec.issue("uuid-123", TokenKind::Access).unwrap();
        let refresh = codec.issue("uuid-123", TokenKind::Refresh).unwrap();

        // Distinct secrets per kind, so the signature check already fails
        assert!(matches!(
            codec.verify(&access.token, TokenKind::Refresh),
            Err(TokenError::InvalidSignature)
        ));
        assert!(matches!(
            codec.verify(&refresh.token, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_kind_claim_checked_even_with_shared_secret() {
        // A misconfigured deployment could reuse one secret for both kinds;
        // the typ claim still keeps the kinds apart.
        let codec = TokenCodec::new(
            b"one-secret-used-for-both-kinds!!",
            b"one-secret-used-for-both-kinds!!",
        );

        let refresh = codec.issue("uuid-123", TokenKind::Refresh).unwrap();
        assert!(matches!(
            codec.verify(&refresh.token, TokenKind::Access),
            Err(TokenError::WrongKind)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let codec = test_codec();
        assert!(matches!(
            codec.verify("not-a-token", TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }
}
