//! Cart owner resolution.
//!
//! Signed in callers shop with their user cart. Anonymous callers name a
//! guest cart with the `X-Session-Id` header.

use salvo::prelude::{Depot, Request};

use bookstore_app::domain::carts::records::{CartOwner, SessionId};

use crate::{errors::ApiError, extensions::*};

pub(crate) const SESSION_ID_HEADER: &str = "x-session-id";

pub(crate) fn cart_owner(req: &Request, depot: &Depot) -> Result<CartOwner, ApiError> {
    if let Some(principal) = depot.principal() {
        return Ok(CartOwner::User(principal.user));
    }

    let Some(value) = req.headers().get(SESSION_ID_HEADER) else {
        return Err(ApiError::unauthorized(
            "Sign in or send an X-Session-Id header",
        ));
    };

    value
        .to_str()
        .ok()
        .and_then(|value| SessionId::parse(value).ok())
        .map(CartOwner::Session)
        .ok_or_else(|| {
            ApiError::bad_request("Invalid session id").with_error(
                "X-Session-Id",
                "must be 1-128 characters of letters, digits, '-' or '_'",
            )
        })
}
