//! Cart Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_app::domain::carts::records::{CartIssue, CartItemRecord, CartRecord};

use crate::errors::ApiError;

/// Cart Item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItemModel {
    pub uuid: Uuid,
    pub book_uuid: Uuid,
    pub quantity: u32,

    /// Unit price in cents, captured when the book was first added
    pub price: u64,
    pub line_total: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<CartItemRecord> for CartItemModel {
    type Error = ApiError;

    fn try_from(item: CartItemRecord) -> Result<Self, Self::Error> {
        let line_total = item
            .line_total()
            .ok_or_else(|| ApiError::internal("cart line total overflow", &item.uuid))?;

        Ok(Self {
            uuid: item.uuid.into(),
            book_uuid: item.book_uuid.into(),
            quantity: item.quantity,
            price: item.price,
            line_total,
            created_at: item.created_at.to_string(),
            updated_at: item.updated_at.to_string(),
        })
    }
}

/// Cart
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartModel {
    /// Absent until the first item is added
    pub uuid: Option<Uuid>,
    pub items: Vec<CartItemModel>,

    /// Sum of line totals in cents
    pub subtotal: u64,
    pub item_count: u32,
    pub updated_at: Option<String>,
}

impl TryFrom<CartRecord> for CartModel {
    type Error = ApiError;

    fn try_from(cart: CartRecord) -> Result<Self, Self::Error> {
        let subtotal = cart
            .subtotal()
            .ok_or_else(|| ApiError::internal("cart subtotal overflow", &cart.owner))?;
        let item_count = cart.item_count();

        Ok(Self {
            uuid: cart.uuid.map(Into::into),
            items: cart
                .items
                .into_iter()
                .map(CartItemModel::try_from)
                .collect::<Result<_, _>>()?,
            subtotal,
            item_count,
            updated_at: cart.updated_at.map(|at| at.to_string()),
        })
    }
}

/// Cart Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub message: String,
    pub cart: CartModel,
}

impl CartResponse {
    pub(crate) fn new(message: &str, cart: CartRecord) -> Result<Self, ApiError> {
        Ok(Self {
            message: message.to_string(),
            cart: cart.try_into()?,
        })
    }
}

/// A cart line that cannot be checked out as it is.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartIssueModel {
    /// `book_unavailable`, `insufficient_stock` or `price_changed`
    pub kind: String,
    pub book_uuid: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_price: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<u64>,
}

impl CartIssueModel {
    fn new(kind: &str, book_uuid: Uuid) -> Self {
        Self {
            kind: kind.to_string(),
            book_uuid,
            requested: None,
            available: None,
            cart_price: None,
            current_price: None,
        }
    }
}

impl From<CartIssue> for CartIssueModel {
    fn from(issue: CartIssue) -> Self {
        match issue {
            CartIssue::BookUnavailable { book } => Self::new("book_unavailable", book.into()),
            CartIssue::InsufficientStock {
                book,
                requested,
                available,
            } => Self {
                requested: Some(requested),
                available: Some(available),
                ..Self::new("insufficient_stock", book.into())
            },
            CartIssue::PriceChanged {
                book,
                cart_price,
                current_price,
            } => Self {
                cart_price: Some(cart_price),
                current_price: Some(current_price),
                ..Self::new("price_changed", book.into())
            },
        }
    }
}
