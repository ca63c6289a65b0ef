use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::codec::{TokenCodec, TokenError};
use super::session::{SessionStore, SessionStoreError};
use super::{AccessClaims, AccessDetails, RefreshClaims, TokenPair, TokenProfile};
use crate::types::CompanyId;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing, expired or revoked session, or a token that fails verification
    #[error("{0}")]
    Unauthenticated(String),

    /// A live session that does not belong to the claimed company
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Token(TokenError),

    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

/// Issues token pairs and resolves bearer tokens to a company through the session store
pub struct AuthResolver {
    codec: Arc<dyn TokenCodec>,
    sessions: Arc<dyn SessionStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthResolver {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        sessions: Arc<dyn SessionStore>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            sessions,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Refresh session key derived from the access key
    pub fn refresh_key(access_uuid: &str, company_id: CompanyId) -> String {
        format!("{access_uuid}++{company_id}")
    }

    pub fn issue_token_pair(&self, profile: &TokenProfile) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();
        let access_uuid = Uuid::new_v4().to_string();
        let refresh_uuid = Self::refresh_key(&access_uuid, profile.company_id);
        let access_expires_at = now + self.access_ttl.as_secs() as i64;
        let refresh_expires_at = now + self.refresh_ttl.as_secs() as i64;

        let access_token = self
            .codec
            .sign_access(&AccessClaims {
                profile: profile.clone(),
                access_uuid: access_uuid.clone(),
                authorized: true,
                exp: access_expires_at,
            })
            .map_err(AuthError::Token)?;
        let refresh_token = self
            .codec
            .sign_refresh(&RefreshClaims {
                profile: profile.clone(),
                refresh_uuid: refresh_uuid.clone(),
                exp: refresh_expires_at,
            })
            .map_err(AuthError::Token)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_uuid,
            refresh_uuid,
            access_expires_at,
            refresh_expires_at,
        })
    }

    pub async fn persist_session(&self, company_id: CompanyId, pair: &TokenPair) -> Result<(), AuthError> {
        let value = company_id.to_string();
        self.sessions.set(&pair.access_uuid, &value, self.access_ttl).await?;
        self.sessions.set(&pair.refresh_uuid, &value, self.refresh_ttl).await?;
        Ok(())
    }

    /// Issue a pair and record both sessions
    pub async fn open_session(&self, profile: &TokenProfile) -> Result<TokenPair, AuthError> {
        let pair = self.issue_token_pair(profile)?;
        self.persist_session(profile.company_id, &pair).await?;
        debug!(company_id = %profile.company_id, "Opened session");
        Ok(pair)
    }

    /// Verify an access token's signature and expiry
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.codec
            .parse_access(token)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))
    }

    pub fn resolve_owner(&self, claims: &AccessClaims) -> AccessDetails {
        AccessDetails {
            access_uuid: claims.access_uuid.clone(),
            company_id: claims.profile.company_id,
        }
    }

    /// Confirm the access session is live and bound to the claimed company
    pub async fn fetch_auth(&self, details: &AccessDetails) -> Result<CompanyId, AuthError> {
        let stored = self
            .sessions
            .get(&details.access_uuid)
            .await?
            .ok_or_else(|| AuthError::Unauthenticated("session not found or expired".to_string()))?;

        match stored.parse::<CompanyId>() {
            Ok(company_id) if company_id == details.company_id => Ok(company_id),
            _ => {
                warn!(claimed = %details.company_id, "Session bound to a different company");
                Err(AuthError::Unauthorized("session does not belong to this company".to_string()))
            }
        }
    }

    /// Remove both sessions of a pair. Either one already gone means the tokens were stale.
    pub async fn logout(&self, details: &AccessDetails) -> Result<(), AuthError> {
        let refresh_uuid = Self::refresh_key(&details.access_uuid, details.company_id);

        let removed_access = self.sessions.delete(&details.access_uuid).await?;
        let removed_refresh = self.sessions.delete(&refresh_uuid).await?;
        if removed_access != 1 || removed_refresh != 1 {
            return Err(AuthError::Unauthenticated("tokens are already invalid".to_string()));
        }

        debug!(company_id = %details.company_id, "Closed session");
        Ok(())
    }

    /// Rotate a refresh token: the old refresh session is deleted before the new pair is stored.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .parse_refresh(refresh_token)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))?;

        if self.sessions.delete(&claims.refresh_uuid).await? != 1 {
            return Err(AuthError::Unauthenticated("refresh session not found or expired".to_string()));
        }

        let pair = self.issue_token_pair(&claims.profile)?;
        self.persist_session(claims.profile.company_id, &pair).await?;
        debug!(company_id = %claims.profile.company_id, "Rotated refresh token");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtCodec, MemorySessionStore};

    fn profile(id: i64) -> TokenProfile {
        TokenProfile {
            company_id: CompanyId(id),
            authorized_name: "Mehmet".to_string(),
            authorized_surname: "Demir".to_string(),
            email: "mehmet@example.com".to_string(),
            is_supplier: true,
            is_constructor: false,
        }
    }

    fn resolver() -> (AuthResolver, Arc<MemorySessionStore>) {
        let sessions = Arc::new(MemorySessionStore::new());
        let resolver = AuthResolver::new(
            Arc::new(JwtCodec::new("access-secret", "refresh-secret")),
            sessions.clone(),
            Duration::from_secs(15 * 60),
            Duration::from_secs(30 * 24 * 60 * 60),
        );
        (resolver, sessions)
    }

    #[test]
    fn refresh_key_is_derived_from_access_key() {
        let (resolver, _) = resolver();
        let pair = resolver.issue_token_pair(&profile(42)).unwrap();
        assert_eq!(pair.refresh_uuid, format!("{}++42", pair.access_uuid));
        assert!(pair.refresh_expires_at > pair.access_expires_at);
    }

    #[tokio::test]
    async fn issued_session_resolves_to_the_same_company() {
        let (resolver, _) = resolver();
        let pair = resolver.open_session(&profile(42)).await.unwrap();

        let claims = resolver.verify_access(&pair.access_token).unwrap();
        let details = resolver.resolve_owner(&claims);
        assert_eq!(resolver.fetch_auth(&details).await.unwrap(), CompanyId(42));
    }

    #[tokio::test]
    async fn mismatched_company_is_unauthorized() {
        let (resolver, sessions) = resolver();
        let pair = resolver.open_session(&profile(42)).await.unwrap();
        sessions
            .set(&pair.access_uuid, "7", Duration::from_secs(60))
            .await
            .unwrap();

        let claims = resolver.verify_access(&pair.access_token).unwrap();
        let result = resolver.fetch_auth(&resolver.resolve_owner(&claims)).await;
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn logout_revokes_a_still_valid_token() {
        let (resolver, _) = resolver();
        let pair = resolver.open_session(&profile(42)).await.unwrap();
        let claims = resolver.verify_access(&pair.access_token).unwrap();
        let details = resolver.resolve_owner(&claims);

        resolver.logout(&details).await.unwrap();

        // signature and expiry still check out
        assert!(resolver.verify_access(&pair.access_token).is_ok());
        assert!(matches!(
            resolver.fetch_auth(&details).await,
            Err(AuthError::Unauthenticated(_))
        ));
        assert!(matches!(
            resolver.logout(&details).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn refresh_tokens_are_single_use() {
        let (resolver, sessions) = resolver();
        let first = resolver.open_session(&profile(42)).await.unwrap();

        let second = resolver.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.access_uuid, first.access_uuid);
        assert!(sessions.get(&first.refresh_uuid).await.unwrap().is_none());
        assert_eq!(sessions.get(&second.refresh_uuid).await.unwrap().as_deref(), Some("42"));

        assert!(matches!(
            resolver.refresh(&first.refresh_token).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let (resolver, _) = resolver();
        let pair = resolver.open_session(&profile(1)).await.unwrap();
        assert!(matches!(
            resolver.refresh(&pair.access_token).await,
            Err(AuthError::Unauthenticated(_))
        ));
    }
}
