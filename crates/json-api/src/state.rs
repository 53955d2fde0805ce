//! State

use std::sync::Arc;

use bookstore_app::{
    auth::AuthService,
    context::AppContext,
    domain::{
        books::BooksService, carts::CartsService, orders::OrdersService, reviews::ReviewsService,
    },
};

/// Services shared by every request handler.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) books: Arc<dyn BooksService>,
    pub(crate) carts: Arc<dyn CartsService>,
    pub(crate) orders: Arc<dyn OrdersService>,
    pub(crate) reviews: Arc<dyn ReviewsService>,
    pub(crate) auth: Arc<dyn AuthService>,
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: &AppContext) -> Arc<Self> {
        Arc::new(Self {
            books: Arc::clone(&app.books),
            carts: Arc::clone(&app.carts),
            orders: Arc::clone(&app.orders),
            reviews: Arc::clone(&app.reviews),
            auth: Arc::clone(&app.auth),
        })
    }
}
