//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        UnknownVariant, books::records::BookUuid, pricing::PriceBreakdown,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Status Change UUID
pub type StatusChangeUuid = TypedUuid<StatusChangeRecord>;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is an edge of the fulfilment state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Pending | Self::Confirmed, Self::Cancelled)
        )
    }

    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("order status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    CashOnDelivery,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::Paypal => "paypal",
            Self::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "paypal" => Ok(Self::Paypal),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            other => Err(UnknownVariant::new("payment method", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    /// Payment status once an order moves to `status`.
    ///
    /// Card and `PayPal` payments are captured on confirmation, cash on
    /// delivery. Cancelling a paid order refunds it.
    #[must_use]
    pub const fn after(self, method: PaymentMethod, status: OrderStatus) -> Self {
        match (self, method, status) {
            (Self::Paid, _, OrderStatus::Cancelled) => Self::Refunded,
            (
                Self::Pending,
                PaymentMethod::CreditCard | PaymentMethod::Paypal,
                OrderStatus::Confirmed,
            )
            | (Self::Pending, PaymentMethod::CashOnDelivery, OrderStatus::Delivered) => Self::Paid,
            (current, _, _) => current,
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariant::new("payment status", other)),
        }
    }
}

/// Postal address, stored as JSON on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// Frozen snapshot of a purchased book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub book_uuid: BookUuid,
    pub seller_uuid: UserUuid,
    pub title: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub line_total: u64,
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeRecord {
    pub uuid: StatusChangeUuid,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub changed_by: Option<UserUuid>,
    pub created_at: Timestamp,
}

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub status: OrderStatus,
    pub items: Vec<OrderItemRecord>,
    pub totals: PriceBreakdown,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tracking_number: Option<String>,
    pub cancel_reason: Option<String>,
    pub idempotency_key: Option<String>,
    pub history: Vec<StatusChangeRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Whether `seller` sold at least one line of this order.
    #[must_use]
    pub fn involves_seller(&self, seller: UserUuid) -> bool {
        self.items.iter().any(|item| item.seller_uuid == seller)
    }
}
