//! Users service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::users::{
        data::NewUser,
        errors::UsersServiceError,
        records::{UserRecord, UserUuid},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    #[tracing::instrument(
        name = "users.service.create_user",
        skip(self, user),
        fields(user_uuid = %user.uuid, role = %user.role),
        err
    )]
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        if user.name.trim().is_empty() || !user.email.contains('@') {
            return Err(UsersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = self.repository.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Register a new user account.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;

    /// Retrieve a single, non-deleted user.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError>;
}
