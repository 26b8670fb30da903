//! Session lifecycle: login, refresh rotation, logout.
//!
//! The session manager is the only component that mints refresh tokens and
//! writes them to the user record. Every issue overwrites the stored value,
//! so at most one refresh token is valid per user at any time; presenting a
//! superseded token fails and is reported distinctly from a malformed one.

use std::sync::Arc;

use crate::auth::CurrentUser;
use crate::db::Database;
use crate::jwt::{IssuedToken, TokenCodec, TokenError, TokenKind};
use crate::password::{self, PasswordError};

/// The access/refresh pair produced by login and refresh.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    codec: Arc<TokenCodec>,
}

/// Normalize a login identifier (username or email) the same way
/// registration normalizes it before storing.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

impl SessionManager {
    pub fn new(db: Database, codec: Arc<TokenCodec>) -> Self {
        Self { db, codec }
    }

    fn issue_pair(&self, subject: &str) -> Result<SessionTokens, SessionError> {
        Ok(SessionTokens {
            access: self
                .codec
                .issue(subject, TokenKind::Access)
                .map_err(SessionError::Token)?,
            refresh: self
                .codec
                .issue(subject, TokenKind::Refresh)
                .map_err(SessionError::Token)?,
        })
    }

    /// Verify credentials and start a session.
    ///
    /// Overwrites any previously stored refresh token, which revokes the
    /// prior session for this user. The returned identity is the redacted
    /// view; secret columns never leave this function.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(CurrentUser, SessionTokens), SessionError> {
        let identifier = normalize_identifier(identifier);
        let user = self
            .db
            .users()
            .find_by_identifier(&identifier)
            .await
            .map_err(SessionError::Store)?
            .ok_or(SessionError::UnknownIdentity)?;

        if !password::verify_password(password, &user.password_hash).map_err(SessionError::Hash)? {
            return Err(SessionError::BadCredentials);
        }

        let tokens = self.issue_pair(&user.uuid)?;
        self.db
            .users()
            .update_refresh_token(user.id, Some(&tokens.refresh.token))
            .await
            .map_err(SessionError::Store)?;

        Ok((user.into(), tokens))
    }

    /// Exchange a refresh token for a new pair, rotating the stored value.
    ///
    /// The presented token must verify against the refresh secret AND be
    /// byte-equal to the stored one. The swap is a conditional UPDATE, so of
    /// two concurrent refreshes with the same token only one can win; the
    /// other observes the mismatch and fails as superseded.
    pub async fn refresh(&self, old_refresh_token: &str) -> Result<SessionTokens, SessionError> {
        let claims = self
            .codec
            .verify(old_refresh_token, TokenKind::Refresh)
            .map_err(|e| match e {
                TokenError::Expired | TokenError::InvalidSignature | TokenError::WrongKind => {
                    SessionError::InvalidRefreshToken
                }
                other => SessionError::Token(other),
            })?;

        let user = self
            .db
            .users()
            .get_by_uuid(&claims.sub)
            .await
            .map_err(SessionError::Store)?
            .ok_or(SessionError::InvalidRefreshToken)?;

        match user.refresh_token.as_deref() {
            Some(stored) if stored == old_refresh_token => {}
            _ => return Err(SessionError::SupersededRefreshToken),
        }

        let tokens = self.issue_pair(&user.uuid)?;
        let swapped = self
            .db
            .users()
            .rotate_refresh_token(user.id, old_refresh_token, &tokens.refresh.token)
            .await
            .map_err(SessionError::Store)?;
        if !swapped {
            return Err(SessionError::SupersededRefreshToken);
        }

        Ok(tokens)
    }

    /// End the user's session by clearing the stored refresh token.
    /// Idempotent: logging out twice is not an error.
    pub async fn logout(&self, user_id: i64) -> Result<(), SessionError> {
        self.db
            .users()
            .update_refresh_token(user_id, None)
            .await
            .map_err(SessionError::Store)
    }
}

/// Errors from session operations, kept distinct so the API layer can map
/// them to precise status codes and stable error codes.
#[derive(Debug)]
pub enum SessionError {
    /// No account matches the login identifier
    UnknownIdentity,
    /// Password verification failed
    BadCredentials,
    /// Refresh token is malformed, expired, or names a missing user
    InvalidRefreshToken,
    /// Refresh token verified but is not the currently stored one
    /// (already used, rotated away, or logged out)
    SupersededRefreshToken,
    /// Store failure
    Store(sqlx::Error),
    /// Token encoding failure
    Token(TokenError),
    /// Password hashing failure
    Hash(PasswordError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::UnknownIdentity => write!(f, "No account matches that identifier"),
            SessionError::BadCredentials => write!(f, "Invalid credentials"),
            SessionError::InvalidRefreshToken => write!(f, "Invalid refresh token"),
            SessionError::SupersededRefreshToken => {
                write!(f, "Refresh token has been superseded or revoked")
            }
            SessionError::Store(e) => write!(f, "Store error: {}", e),
            SessionError::Token(e) => write!(f, "Token error: {}", e),
            SessionError::Hash(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;

    async fn setup() -> (SessionManager, Database) {
        let db = Database::open(":memory:").await.unwrap();
        let codec = Arc::new(TokenCodec::new(
            b"access-secret-for-testing-only!!",
            b"refresh-secret-for-testing-only!",
        ));
        (SessionManager::new(db.clone(), codec), db)
    }

    async fn create_user(db: &Database, username: &str, password: &str) -> i64 {
        let hash = hash_password(password).unwrap();
        db.users()
            .create(
                &format!("uuid-{}", username),
                username,
                &format!("{}@example.com", username),
                username,
                &hash,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_returns_tokens_and_persists_refresh() {
        let (sessions, db) = setup().await;
        let id = create_user(&db, "alice", "correct").await;

        let (user, tokens) = sessions.login("alice", "correct").await.unwrap();
        assert_eq!(user.id, id);
        assert!(!tokens.access.token.is_empty());
        assert!(!tokens.refresh.token.is_empty());

        let stored = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some(tokens.refresh.token.as_str()));
    }

    #[tokio::test]
    async fn test_login_accepts_email_and_mixed_case() {
        let (sessions, db) = setup().await;
        create_user(&db, "alice", "correct").await;

        assert!(sessions.login("alice@example.com", "correct").await.is_ok());
        assert!(sessions.login("  Alice  ", "correct").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_distinct() {
        let (sessions, db) = setup().await;
        create_user(&db, "alice", "correct").await;

        assert!(matches!(
            sessions.login("nobody", "correct").await,
            Err(SessionError::UnknownIdentity)
        ));
        assert!(matches!(
            sessions.login("alice", "wrong").await,
            Err(SessionError::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_reuse() {
        let (sessions, db) = setup().await;
        create_user(&db, "alice", "correct").await;

        let (_, tokens) = sessions.login("alice", "correct").await.unwrap();
        let rt1 = tokens.refresh.token;

        let rotated = sessions.refresh(&rt1).await.unwrap();
        let rt2 = rotated.refresh.token;
        assert_ne!(rt1, rt2);

        // The used token is permanently dead
        assert!(matches!(
            sessions.refresh(&rt1).await,
            Err(SessionError::SupersededRefreshToken)
        ));
        // The fresh one still works
        assert!(sessions.refresh(&rt2).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_login_invalidates_first_session() {
        let (sessions, db) = setup().await;
        create_user(&db, "alice", "correct").await;

        let (_, first) = sessions.login("alice", "correct").await.unwrap();
        let (_, second) = sessions.login("alice", "correct").await.unwrap();

        assert!(matches!(
            sessions.refresh(&first.refresh.token).await,
            Err(SessionError::SupersededRefreshToken)
        ));
        assert!(sessions.refresh(&second.refresh.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_kills_refresh() {
        let (sessions, db) = setup().await;
        let id = create_user(&db, "alice", "correct").await;

        let (_, tokens) = sessions.login("alice", "correct").await.unwrap();

        sessions.logout(id).await.unwrap();
        sessions.logout(id).await.unwrap();

        assert!(matches!(
            sessions.refresh(&tokens.refresh.token).await,
            Err(SessionError::SupersededRefreshToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_garbage_token_is_invalid() {
        let (sessions, _db) = setup().await;
        assert!(matches!(
            sessions.refresh("garbage").await,
            Err(SessionError::InvalidRefreshToken)
        ));
    }
}
