//! Cart Records

use std::fmt;

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    domain::{books::records::BookUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Longest accepted guest session identifier.
pub const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session id must be 1-{MAX_SESSION_ID_LEN} characters of [A-Za-z0-9_-]")]
pub struct InvalidSessionId;

/// Opaque identifier of a guest shopping session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Validate a client-supplied session identifier.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is empty, too long, or has characters
    /// outside `[A-Za-z0-9_-]`.
    pub fn parse(value: &str) -> Result<Self, InvalidSessionId> {
        let valid = !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'));

        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidSessionId)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(UserUuid),
    Session(SessionId),
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Session(session) => write!(f, "session:{session}"),
        }
    }
}

/// Cart Record. `uuid` is `None` until the first item is added.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub uuid: Option<CartUuid>,
    pub owner: CartOwner,
    pub items: Vec<CartItemRecord>,
    pub updated_at: Option<Timestamp>,
}

impl CartRecord {
    #[must_use]
    pub fn empty(owner: CartOwner) -> Self {
        Self {
            uuid: None,
            owner,
            items: Vec::new(),
            updated_at: None,
        }
    }

    /// Sum of line totals at the captured prices. `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<u64> {
        self.items
            .iter()
            .try_fold(0_u64, |acc, item| acc.checked_add(item.line_total()?))
    }

    /// Number of books across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn item(&self, book: BookUuid) -> Option<&CartItemRecord> {
        self.items.iter().find(|item| item.book_uuid == book)
    }
}

/// CartItem Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub book_uuid: BookUuid,
    pub quantity: u32,
    pub price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItemRecord {
    #[must_use]
    pub fn line_total(&self) -> Option<u64> {
        self.price.checked_mul(u64::from(self.quantity))
    }
}

/// A reason a cart line could not be checked out as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartIssue {
    BookUnavailable {
        book: BookUuid,
    },
    InsufficientStock {
        book: BookUuid,
        requested: u32,
        available: u32,
    },
    PriceChanged {
        book: BookUuid,
        cart_price: u64,
        current_price: u64,
    },
}
