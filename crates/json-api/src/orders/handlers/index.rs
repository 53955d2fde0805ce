//! List Orders Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::QueryParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bookstore_app::domain::{
    Page,
    orders::{data::OrderQuery, records::OrderStatus},
};

use crate::{
    errors::ApiError,
    extensions::*,
    orders::{errors::into_api_error, models::OrderModel},
    state::State,
};

/// Orders Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    pub message: String,
    pub orders: Vec<OrderModel>,
    pub limit: u32,
    pub offset: u32,
}

/// List Orders Handler
///
/// Buyers see their own orders, sellers see orders containing their books and
/// admins see everything. Newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders listed"),
    ),
)]
#[tracing::instrument(name = "orders.index", skip(status, limit, offset, depot), err)]
pub(crate) async fn handler(
    status: QueryParam<String, false>,
    limit: QueryParam<u32, false>,
    offset: QueryParam<u32, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;

    let status = status
        .into_inner()
        .map(|status| status.parse::<OrderStatus>())
        .transpose()
        .map_err(|source| {
            ApiError::bad_request(source.to_string()).with_error(
                "status",
                "must be one of pending, confirmed, processing, shipped, delivered, cancelled",
            )
        })?;

    let page = Page::new(limit.into_inner(), offset.into_inner());

    let orders = state
        .orders
        .list_orders(actor, OrderQuery { status, page })
        .await
        .map_err(into_api_error)?;

    Ok(Json(OrdersResponse {
        message: "Orders retrieved".to_string(),
        orders: orders.into_iter().map(Into::into).collect(),
        limit: page.limit,
        offset: page.offset,
    }))
}
