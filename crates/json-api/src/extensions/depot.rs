//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;

use bookstore_app::auth::Principal;

use crate::errors::ApiError;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_principal(&mut self, principal: Principal);

    /// The authenticated caller, if the request carried a valid token.
    fn principal(&self) -> Option<Principal>;

    fn principal_or_401(&self) -> Result<Principal, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>().map_err(|_ignored| {
            ApiError::internal(
                "missing depot value",
                &std::any::type_name::<T>(),
            )
        })
    }

    fn insert_principal(&mut self, principal: Principal) {
        self.inject(principal);
    }

    fn principal(&self) -> Option<Principal> {
        self.obtain::<Principal>().ok().copied()
    }

    fn principal_or_401(&self) -> Result<Principal, ApiError> {
        self.principal()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use bookstore_app::domain::users::records::{Role, UserUuid};
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn principal_round_trips_through_the_depot() {
        let principal = Principal {
            user: UserUuid::new(),
            role: Role::Buyer,
        };

        let mut depot = Depot::new();

        assert_eq!(
            depot.principal_or_401().map_err(|error| error.status()),
            Err(StatusCode::UNAUTHORIZED)
        );

        depot.insert_principal(principal);

        assert_eq!(depot.principal(), Some(principal));
    }
}
