//! Order Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::orders::records::{
    Address, OrderItemRecord, OrderRecord, StatusChangeRecord,
};

use crate::{errors::FieldError, validation::Checks};

const MAX_NAME_LEN: usize = 120;
const MAX_LINE_LEN: usize = 200;
const MAX_REGION_LEN: usize = 100;
const MAX_POSTAL_CODE_LEN: usize = 20;

/// Postal Address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddressModel {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl AddressModel {
    /// Check every field, reporting them under `prefix`, e.g. `shippingAddress.city`.
    pub(crate) fn check(&self, prefix: &str, errors: &mut Vec<FieldError>) {
        let field = |name: &str| format!("{prefix}.{name}");

        Checks::new(errors)
            .text(&field("name"), &self.name, MAX_NAME_LEN)
            .text(&field("line1"), &self.line1, MAX_LINE_LEN)
            .optional_text(&field("line2"), self.line2.as_deref(), MAX_LINE_LEN)
            .text(&field("city"), &self.city, MAX_REGION_LEN)
            .optional_text(&field("state"), self.state.as_deref(), MAX_REGION_LEN)
            .text(&field("postalCode"), &self.postal_code, MAX_POSTAL_CODE_LEN)
            .text(&field("country"), &self.country, MAX_REGION_LEN);
    }
}

impl From<AddressModel> for Address {
    fn from(address: AddressModel) -> Self {
        Address {
            name: address.name.trim().to_string(),
            line1: address.line1.trim().to_string(),
            line2: address.line2,
            city: address.city.trim().to_string(),
            state: address.state,
            postal_code: address.postal_code.trim().to_string(),
            country: address.country.trim().to_string(),
        }
    }
}

impl From<Address> for AddressModel {
    fn from(address: Address) -> Self {
        Self {
            name: address.name,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
        }
    }
}

/// Order Item, frozen at checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderItemModel {
    pub uuid: Uuid,
    pub book_uuid: Uuid,
    pub seller_uuid: Uuid,
    pub title: String,
    pub quantity: u32,

    /// Cents
    pub unit_price: u64,
    pub line_total: u64,
}

impl From<OrderItemRecord> for OrderItemModel {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            uuid: item.uuid.into(),
            book_uuid: item.book_uuid.into(),
            seller_uuid: item.seller_uuid.into(),
            title: item.title,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
        }
    }
}

/// Status History Entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusChangeModel {
    pub status: String,
    pub note: Option<String>,
    pub changed_by: Option<Uuid>,
    pub created_at: String,
}

impl From<StatusChangeRecord> for StatusChangeModel {
    fn from(change: StatusChangeRecord) -> Self {
        Self {
            status: change.status.to_string(),
            note: change.note,
            changed_by: change.changed_by.map(Into::into),
            created_at: change.created_at.to_string(),
        }
    }
}

/// Order
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderModel {
    pub uuid: Uuid,
    pub user_uuid: Uuid,

    /// `pending`, `confirmed`, `processing`, `shipped`, `delivered` or `cancelled`
    pub status: String,
    pub items: Vec<OrderItemModel>,

    /// Amounts in cents
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,

    pub shipping_address: AddressModel,
    pub billing_address: AddressModel,
    pub payment_method: String,
    pub payment_status: String,
    pub tracking_number: Option<String>,
    pub cancel_reason: Option<String>,
    pub history: Vec<StatusChangeModel>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderRecord> for OrderModel {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into(),
            user_uuid: order.user_uuid.into(),
            status: order.status.to_string(),
            items: order.items.into_iter().map(Into::into).collect(),
            subtotal: order.totals.subtotal,
            tax: order.totals.tax,
            shipping: order.totals.shipping,
            discount: order.totals.discount,
            total: order.totals.total,
            shipping_address: order.shipping_address.into(),
            billing_address: order.billing_address.into(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            tracking_number: order.tracking_number,
            cancel_reason: order.cancel_reason,
            history: order.history.into_iter().map(Into::into).collect(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

/// Single Order Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub message: String,
    pub order: OrderModel,
}

impl OrderResponse {
    pub(crate) fn new(message: &str, order: OrderRecord) -> Self {
        Self {
            message: message.to_string(),
            order: order.into(),
        }
    }
}
