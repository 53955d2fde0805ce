//! App Router

use salvo::Router;

use crate::{auth, books, carts, orders, reviews};

/// Routes under `/api`.
///
/// Catalog reads and carts accept anonymous callers. Everything else needs a
/// bearer token.
pub(crate) fn app_router() -> Router {
    Router::with_path("api")
        .push(public_routes())
        .push(protected_routes())
}

fn public_routes() -> Router {
    Router::new()
        .hoop(auth::middleware::optional)
        .push(
            Router::with_path("books").get(books::index::handler).push(
                Router::with_path("{book}")
                    .get(books::get::handler)
                    .push(Router::with_path("reviews").get(reviews::index::handler)),
            ),
        )
        .push(Router::with_path("reviews/{review}").get(reviews::get::handler))
        .push(
            Router::with_path("cart")
                .get(carts::get::handler)
                .delete(carts::clear::handler)
                .push(Router::with_path("validate").get(carts::validate::handler))
                .push(Router::with_path("merge").post(carts::merge::handler))
                .push(
                    Router::with_path("items")
                        .post(carts::items::create::handler)
                        .push(
                            Router::with_path("{book}")
                                .put(carts::items::update::handler)
                                .delete(carts::items::delete::handler),
                        ),
                ),
        )
}

fn protected_routes() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(
            Router::with_path("books").post(books::create::handler).push(
                Router::with_path("{book}")
                    .put(books::update::handler)
                    .delete(books::delete::handler)
                    .push(Router::with_path("stock").put(books::stock::handler)),
            ),
        )
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .post(orders::create::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .push(Router::with_path("status").put(orders::status::handler))
                        .push(Router::with_path("cancel").put(orders::cancel::handler)),
                ),
        )
        .push(
            Router::with_path("reviews").post(reviews::create::handler).push(
                Router::with_path("{review}")
                    .put(reviews::update::handler)
                    .delete(reviews::delete::handler)
                    .push(Router::with_path("helpful").post(reviews::vote::handler))
                    .push(Router::with_path("flag").post(reviews::flag::handler))
                    .push(Router::with_path("moderation").put(reviews::moderate::handler)),
            ),
        )
}
