//! Cart Data

use crate::domain::{books::records::BookUuid, carts::records::CartItemUuid};

/// New Cart Item Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewCartItem {
    pub uuid: CartItemUuid,
    pub book_uuid: BookUuid,
    pub quantity: u32,
    pub price: u64,
}
