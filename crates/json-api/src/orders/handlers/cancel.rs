//! Cancel Order Handler

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

use crate::{
    errors::{ApiError, FieldError},
    extensions::*,
    observability::metrics,
    orders::{errors::into_api_error, handlers::MAX_NOTE_LEN, models::OrderResponse},
    state::State,
    validation::{Checks, Validate, validated},
};

/// Cancel Order Request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct CancelOrderRequest {
    pub reason: Option<String>,
}

impl Validate for CancelOrderRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        Checks::new(errors).optional_text("reason", self.reason.as_deref(), MAX_NOTE_LEN);
    }
}

/// Cancel Order Handler
///
/// Only pending or confirmed orders can be cancelled. Stock is returned to the
/// catalog and paid orders are marked refunded.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::BAD_REQUEST, description = "Order already shipped or cancelled"),
    ),
)]
#[tracing::instrument(
    name = "orders.cancel",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<CancelOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let order = order.into_inner();

    tracing::Span::current().record("order_uuid", tracing::field::display(order));

    let request = validated(json)?;

    let order = state
        .orders
        .cancel(actor, order.into(), request.reason)
        .await
        .map_err(into_api_error)?;

    metrics::record_order_cancelled();

    Ok(Json(OrderResponse::new("Order cancelled", order)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bookstore_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        records::{OrderStatus, OrderUuid, PaymentStatus},
    };

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{buyer, orders_service},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Some(buyer()),
            Router::with_path("api/orders/{order}/cancel").put(handler),
        )
    }

    #[tokio::test]
    async fn test_cancel_forwards_the_reason() -> TestResult {
        let uuid = OrderUuid::new();
        let mut orders = MockOrdersService::new();

        orders
            .expect_cancel()
            .once()
            .withf(move |_, order, reason| {
                *order == uuid && reason.as_deref() == Some("Ordered twice")
            })
            .return_once(move |_, _, reason| {
                let mut order = make_order(uuid, OrderStatus::Cancelled);

                order.cancel_reason = reason;
                order.payment_status = PaymentStatus::Refunded;

                Ok(order)
            });

        let mut res = TestClient::put(format!("http://example.com/api/orders/{uuid}/cancel"))
            .json(&json!({ "reason": "Ordered twice" }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.order.status, "cancelled");
        assert_eq!(body.order.payment_status, "refunded");
        assert_eq!(body.order.cancel_reason.as_deref(), Some("Ordered twice"));

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_shipped_order_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_cancel().once().return_once(|_, _, _| {
            Err(OrdersServiceError::NotCancellable {
                status: OrderStatus::Shipped,
            })
        });

        let mut res = TestClient::put(format!(
            "http://example.com/api/orders/{}/cancel",
            Uuid::now_v7()
        ))
        .json(&json!({}))
        .send(&make_service(orders))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: serde_json::Value = res.take_json().await?;

        assert_eq!(
            body.get("message").and_then(serde_json::Value::as_str),
            Some("Order cannot be cancelled once shipped")
        );

        Ok(())
    }
}
