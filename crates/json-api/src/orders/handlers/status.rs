//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::orders::{data::StatusUpdate, records::OrderStatus};

use crate::{
    errors::{ApiError, FieldError},
    extensions::*,
    observability::metrics,
    orders::{errors::into_api_error, handlers::MAX_NOTE_LEN, models::OrderResponse},
    state::State,
    validation::{Checks, Validate, validated},
};

const MAX_TRACKING_NUMBER_LEN: usize = 100;

/// Update Order Status Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateOrderStatusRequest {
    /// Next status along the fulfilment chain
    pub status: String,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

impl Validate for UpdateOrderStatusRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let mut checks = Checks::new(errors);

        if self.status.parse::<OrderStatus>().is_err() {
            checks.fail(
                "status",
                "must be one of pending, confirmed, processing, shipped, delivered, cancelled",
            );
        }

        checks
            .optional_text("note", self.note.as_deref(), MAX_NOTE_LEN)
            .optional_text(
                "trackingNumber",
                self.tracking_number.as_deref(),
                MAX_TRACKING_NUMBER_LEN,
            );
    }
}

impl TryFrom<UpdateOrderStatusRequest> for StatusUpdate {
    type Error = ApiError;

    fn try_from(request: UpdateOrderStatusRequest) -> Result<Self, Self::Error> {
        Ok(StatusUpdate {
            status: request
                .status
                .parse::<OrderStatus>()
                .map_err(|source| ApiError::bad_request(source.to_string()))?,
            note: request.note,
            tracking_number: request.tracking_number.map(|number| number.trim().to_string()),
        })
    }
}

/// Update Order Status Handler
///
/// Admins and sellers with a line in the order move it along
/// `pending → confirmed → processing → shipped → delivered`. Setting
/// `cancelled` cancels the order and returns its stock.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::BAD_REQUEST, description = "Transition not allowed"),
        (status_code = StatusCode::FORBIDDEN, description = "Not staff for this order"),
    ),
)]
#[tracing::instrument(
    name = "orders.update_status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, status = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateOrderStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let order = order.into_inner();

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let update = StatusUpdate::try_from(validated(json)?)?;

    tracing::Span::current().record("status", update.status.as_str());

    let cancelling = update.status == OrderStatus::Cancelled;

    let order = state
        .orders
        .update_status(actor, order.into(), update)
        .await
        .map_err(into_api_error)?;

    if cancelling {
        metrics::record_order_cancelled();
    }

    Ok(Json(OrderResponse::new("Order status updated", order)))
}
