//! Create Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::orders::{
    data::{IdempotencyKey, NewOrder, NewOrderLine},
    records::{OrderUuid, PaymentMethod},
};

use crate::{
    errors::{ApiError, FieldError},
    extensions::*,
    observability::metrics,
    orders::{
        errors::{into_api_error, rejection_reason},
        models::{AddressModel, OrderResponse},
    },
    state::State,
    validation::{Checks, Validate, validated},
};

pub(crate) const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Most distinct lines accepted in one checkout.
const MAX_ORDER_LINES: usize = 50;

/// Requested copies of one book
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderLineRequest {
    pub book_uuid: Uuid,
    pub quantity: u32,
}

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: AddressModel,

    /// Defaults to the shipping address
    pub billing_address: Option<AddressModel>,

    /// `credit_card`, `paypal` or `cash_on_delivery`
    pub payment_method: String,

    /// Empty the caller's cart once the order is placed
    #[serde(default)]
    pub clear_cart: bool,
}

impl Validate for CreateOrderRequest {
    fn validate(&self, errors: &mut Vec<FieldError>) {
        let mut checks = Checks::new(errors);

        if self.items.is_empty() {
            checks.fail("items", "must not be empty");
        } else if self.items.len() > MAX_ORDER_LINES {
            checks.fail("items", format!("must have at most {MAX_ORDER_LINES} lines"));
        }

        if self.items.iter().any(|line| line.quantity == 0) {
            checks.fail("items", "quantities must be at least 1");
        }

        if self.payment_method.parse::<PaymentMethod>().is_err() {
            checks.fail(
                "paymentMethod",
                "must be one of credit_card, paypal, cash_on_delivery",
            );
        }

        self.shipping_address.check("shippingAddress", errors);

        if let Some(billing) = &self.billing_address {
            billing.check("billingAddress", errors);
        }
    }
}

impl CreateOrderRequest {
    fn into_new_order(self, idempotency_key: Option<IdempotencyKey>) -> Result<NewOrder, ApiError> {
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|source| ApiError::bad_request(source.to_string()))?;

        Ok(NewOrder {
            uuid: OrderUuid::new(),
            items: self
                .items
                .into_iter()
                .map(|line| NewOrderLine {
                    book: line.book_uuid.into(),
                    quantity: line.quantity,
                })
                .collect(),
            shipping_address: self.shipping_address.into(),
            billing_address: self.billing_address.map(Into::into),
            payment_method,
            idempotency_key,
            clear_cart: self.clear_cart,
        })
    }
}

fn idempotency_key(req: &Request) -> Result<Option<IdempotencyKey>, ApiError> {
    let Some(value) = req.headers().get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|value| IdempotencyKey::parse(value).ok())
        .map(Some)
        .ok_or_else(|| {
            ApiError::bad_request("Invalid idempotency key").with_error(
                "Idempotency-Key",
                "must be 16-128 visible ASCII characters",
            )
        })
}

/// Create Order Handler
///
/// Places the order and reserves its stock in one step. Retrying with the same
/// `Idempotency-Key` returns the original order with a 200.
#[endpoint(
    tags("orders"),
    summary = "Place Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::OK, description = "Order already placed with this idempotency key"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty order, unavailable book, or not enough stock"),
    ),
)]
#[tracing::instrument(
    name = "orders.create",
    skip(req, json, depot, res),
    fields(order_uuid = tracing::field::Empty, replay = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.principal_or_401()?;
    let key = idempotency_key(req)?;

    let request = validated(json).inspect_err(|_| metrics::record_checkout_rejection("validation"))?;

    let placement = state
        .orders
        .create_order(actor, request.into_new_order(key)?)
        .await
        .map_err(|error| {
            if let Some(reason) = rejection_reason(&error) {
                metrics::record_checkout_rejection(reason);
            }

            into_api_error(error)
        })?;

    let replay = placement.is_replay();
    let order = placement.into_order();

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order.uuid));
    span.record("replay", replay);

    if replay {
        return Ok(Json(OrderResponse::new("Order already placed", order)));
    }

    metrics::record_order_created();

    res.add_header(LOCATION, format!("/api/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(OrderResponse::new("Order placed", order)))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bookstore_app::domain::{
        books::records::BookUuid,
        orders::{
            MockOrdersService, OrdersServiceError, data::OrderPlacement, records::OrderStatus,
        },
    };

    use crate::{
        orders::handlers::tests::make_order,
        test_helpers::{TEST_USER_UUID, buyer, orders_service},
    };

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Some(buyer()),
            Router::with_path("api/orders").post(handler),
        )
    }

    fn body(book: Uuid, quantity: u32) -> Value {
        json!({
            "items": [{ "bookUuid": book, "quantity": quantity }],
            "shippingAddress": {
                "name": "Ada Lovelace",
                "line1": "12 St James's Square",
                "city": "London",
                "postalCode": "SW1Y 4JH",
                "country": "GB",
            },
            "paymentMethod": "credit_card",
            "clearCart": true,
        })
    }

    #[tokio::test]
    async fn test_create_order_returns_201_with_location() -> TestResult {
        let book = BookUuid::new();
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .withf(move |actor, order| {
                actor.user == TEST_USER_UUID
                    && order.items == vec![NewOrderLine { book, quantity: 2 }]
                    && order.payment_method == PaymentMethod::CreditCard
                    && order.billing_address.is_none()
                    && order.idempotency_key.is_none()
                    && order.clear_cart
            })
            .return_once(|_, order| {
                Ok(OrderPlacement::Created(make_order(order.uuid, OrderStatus::Pending)))
            });

        let mut res = TestClient::post("http://example.com/api/orders")
            .json(&body(book.into(), 2))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: OrderResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(
            location,
            Some(format!("/api/orders/{}", body.order.uuid).as_str())
        );
        assert_eq!(body.order.status, "pending");
        assert_eq!(body.order.total, 49_19);

        Ok(())
    }

    #[tokio::test]
    async fn test_replayed_order_returns_200() -> TestResult {
        let key = "checkout-0190f3c2-6c1e";
        let uuid = OrderUuid::new();
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .withf(move |_, order| {
                order.idempotency_key.as_ref().map(IdempotencyKey::as_str) == Some(key)
            })
            .return_once(move |_, _| {
                Ok(OrderPlacement::Replayed(make_order(uuid, OrderStatus::Confirmed)))
            });

        let mut res = TestClient::post("http://example.com/api/orders")
            .add_header(IDEMPOTENCY_KEY_HEADER, key, true)
            .json(&body(Uuid::now_v7(), 1))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: OrderResponse = res.take_json().await?;

        assert_eq!(body.message, "Order already placed");
        assert_eq!(body.order.uuid, Uuid::from(uuid));

        Ok(())
    }

    #[tokio::test]
    async fn test_short_idempotency_key_is_rejected() -> TestResult {
        let res = TestClient::post("http://example.com/api/orders")
            .add_header(IDEMPOTENCY_KEY_HEADER, "short", true)
            .json(&body(Uuid::now_v7(), 1))
            .send(&make_service(MockOrdersService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_stock_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_create_order().once().return_once(|_, order| {
            Err(OrdersServiceError::InsufficientStock {
                book: order.items.first().map_or_else(BookUuid::new, |line| line.book),
                requested: 3,
                available: 1,
            })
        });

        let res = TestClient::post("http://example.com/api/orders")
            .json(&body(Uuid::now_v7(), 3))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_request_lists_every_field() -> TestResult {
        let mut res = TestClient::post("http://example.com/api/orders")
            .json(&json!({
                "items": [],
                "shippingAddress": {
                    "name": "",
                    "line1": "1 Main St",
                    "city": "Springfield",
                    "postalCode": "12345",
                    "country": "US",
                },
                "paymentMethod": "cheque",
            }))
            .send(&make_service(MockOrdersService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;
        let fields: Vec<&str> = body
            .get("errors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|error| error.get("field").and_then(Value::as_str))
            .collect();

        assert_eq!(fields, vec!["items", "paymentMethod", "shippingAddress.name"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_requires_authentication() -> TestResult {
        let res = TestClient::post("http://example.com/api/orders")
            .json(&body(Uuid::now_v7(), 1))
            .send(&orders_service(
                MockOrdersService::new(),
                None,
                Router::with_path("api/orders").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
