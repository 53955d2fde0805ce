//! Auth data models.

use jiff::Timestamp;

use crate::{
    domain::users::records::{Role, UserUuid},
    uuids::TypedUuid,
};

/// API Token UUID
pub type ApiTokenUuid = TypedUuid<ApiTokenMetadata>;

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user: UserUuid,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    #[must_use]
    pub const fn can_sell(&self) -> bool {
        self.role.can_sell()
    }
}

/// API token metadata persisted in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiTokenMetadata {
    pub uuid: ApiTokenUuid,
    pub user_uuid: UserUuid,
    pub created_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
}

/// New API token persistence payload.
#[derive(Debug, Clone)]
pub(crate) struct NewApiToken {
    pub uuid: ApiTokenUuid,
    pub user_uuid: UserUuid,
    pub token_hash: String,
}

/// API token issuance result with one-time raw token.
#[derive(Debug, Clone)]
pub struct IssuedApiToken {
    pub token: String,
    pub metadata: ApiTokenMetadata,
}
