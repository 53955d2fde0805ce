//! Test Helpers

use crate::domain::{
    books::{data::NewBook, records::BookUuid},
    orders::{
        data::{NewOrder, NewOrderLine},
        records::{Address, OrderUuid, PaymentMethod},
    },
    reviews::{
        data::NewReview,
        records::{Rating, ReviewUuid},
    },
};

pub(crate) fn new_book(title: &str, price: u64, stock: u32) -> NewBook {
    NewBook {
        uuid: BookUuid::new(),
        title: title.to_string(),
        author: "Test Author".to_string(),
        isbn: None,
        description: None,
        price,
        stock,
    }
}

pub(crate) fn address() -> Address {
    Address {
        name: "Ada Reader".to_string(),
        line1: "1 Library Lane".to_string(),
        line2: None,
        city: "Springfield".to_string(),
        state: Some("IL".to_string()),
        postal_code: "62701".to_string(),
        country: "US".to_string(),
    }
}

/// A card-paid order for `(book, quantity)` lines.
pub(crate) fn new_order(lines: &[(BookUuid, u32)]) -> NewOrder {
    NewOrder {
        uuid: OrderUuid::new(),
        items: lines
            .iter()
            .map(|&(book, quantity)| NewOrderLine { book, quantity })
            .collect(),
        shipping_address: address(),
        billing_address: None,
        payment_method: PaymentMethod::CreditCard,
        idempotency_key: None,
        clear_cart: false,
    }
}

pub(crate) fn new_review(book: BookUuid, rating: u8) -> NewReview {
    NewReview {
        uuid: ReviewUuid::new(),
        book,
        rating: Rating::new(rating).expect("test rating should be 1..=5"),
        title: "Worth reading".to_string(),
        comment: "Kept me up at night.".to_string(),
    }
}
