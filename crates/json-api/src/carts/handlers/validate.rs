//! Validate Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    carts::{errors::into_api_error, models::CartIssueModel, owner::cart_owner},
    errors::ApiError,
    extensions::*,
    state::State,
};

/// Cart Validation Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartValidationResponse {
    pub message: String,

    /// `true` when every line can be checked out as it is
    pub valid: bool,
    pub issues: Vec<CartIssueModel>,
}

/// Validate Cart Handler
///
/// Checks every line against current availability, stock and price without
/// changing the cart.
#[endpoint(
    tags("carts"),
    summary = "Validate Cart",
    security(("bearer_auth" = []), ("session_id" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart checked"),
    ),
)]
#[tracing::instrument(name = "carts.validate", skip(req, depot), err)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartValidationResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = cart_owner(req, depot)?;

    let issues = state.carts.validate(owner).await.map_err(into_api_error)?;

    let message = if issues.is_empty() {
        "Cart is ready for checkout"
    } else {
        "Cart has items that need attention"
    };

    Ok(Json(CartValidationResponse {
        message: message.to_string(),
        valid: issues.is_empty(),
        issues: issues.into_iter().map(Into::into).collect(),
    }))
}
