//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::{
    auth::{
        ApiTokenMetadata, ApiTokenUuid, AuthServiceError, IssuedApiToken, Principal,
        format_api_token, generate_api_token_secret, hash_api_token,
        models::NewApiToken,
        parse_api_token,
        repository::PgAuthRepository,
    },
    domain::users::records::UserUuid,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    repository: PgAuthRepository,
}

impl PgAuthService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgAuthRepository::new(pool),
        }
    }

    /// Issue a new API token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the insert fails.
    pub async fn issue_api_token(&self, user: UserUuid) -> Result<IssuedApiToken, AuthServiceError> {
        let secret = generate_api_token_secret();
        let token = format_api_token(&secret);

        let metadata = self
            .repository
            .create_api_token(&NewApiToken {
                uuid: ApiTokenUuid::new(),
                user_uuid: user,
                token_hash: hash_api_token(&token),
            })
            .await?;

        Ok(IssuedApiToken { token, metadata })
    }

    /// List all tokens for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_api_tokens(
        &self,
        user: UserUuid,
    ) -> Result<Vec<ApiTokenMetadata>, AuthServiceError> {
        self.repository
            .list_api_tokens_by_user(user)
            .await
            .map_err(AuthServiceError::from)
    }

    /// Revoke a token by UUID. Returns `true` if the token was active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn revoke_api_token(&self, token: ApiTokenUuid) -> Result<bool, AuthServiceError> {
        self.repository
            .revoke_api_token(token)
            .await
            .map(|record| record.is_some())
            .map_err(AuthServiceError::from)
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        parse_api_token(bearer_token).map_err(|_| AuthServiceError::NotFound)?;

        let token = self
            .repository
            .find_active_api_token_by_hash(&hash_api_token(bearer_token))
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        // Best-effort metadata update; auth success should not depend on this write.
        if let Err(error) = self.repository.touch_api_token_last_used(token.uuid).await {
            tracing::debug!(%error, token_uuid = %token.uuid, "failed to touch api token");
        }

        Ok(token.principal)
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the user and role it acts as.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError>;
}
