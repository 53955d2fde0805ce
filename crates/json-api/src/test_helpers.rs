//! Test helpers.

use std::sync::Arc;

use bookstore_app::{
    auth::{MockAuthService, Principal},
    domain::{
        books::MockBooksService,
        carts::MockCartsService,
        orders::MockOrdersService,
        reviews::MockReviewsService,
        users::records::{Role, UserUuid},
    },
};
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

pub(crate) fn buyer() -> Principal {
    Principal {
        user: TEST_USER_UUID,
        role: Role::Buyer,
    }
}

pub(crate) fn seller() -> Principal {
    Principal {
        user: TEST_USER_UUID,
        role: Role::Seller,
    }
}

pub(crate) fn admin() -> Principal {
    Principal {
        user: TEST_USER_UUID,
        role: Role::Admin,
    }
}

/// Stands in for the auth middleware with a fixed caller.
#[derive(Debug, Clone, Copy)]
struct InjectPrincipal(Principal);

#[handler]
impl InjectPrincipal {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_principal(self.0);
        ctrl.call_next(req, depot, res).await;
    }
}

fn strict_auth_mock() -> MockAuthService {
    let mut auth = MockAuthService::new();

    auth.expect_authenticate_bearer().never();

    auth
}

fn strict_books_mock() -> MockBooksService {
    let mut books = MockBooksService::new();

    books.expect_list_books().never();
    books.expect_get_book().never();
    books.expect_create_book().never();
    books.expect_update_book().never();
    books.expect_delete_book().never();
    books.expect_adjust_stock().never();

    books
}

fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_add_item().never();
    carts.expect_update_item().never();
    carts.expect_remove_item().never();
    carts.expect_clear().never();
    carts.expect_merge().never();
    carts.expect_validate().never();

    carts
}

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_get_order().never();
    orders.expect_list_orders().never();
    orders.expect_update_status().never();
    orders.expect_cancel().never();

    orders
}

fn strict_reviews_mock() -> MockReviewsService {
    let mut reviews = MockReviewsService::new();

    reviews.expect_create_review().never();
    reviews.expect_get_review().never();
    reviews.expect_list_reviews().never();
    reviews.expect_update_review().never();
    reviews.expect_delete_review().never();
    reviews.expect_vote().never();
    reviews.expect_flag_review().never();
    reviews.expect_moderate_review().never();

    reviews
}

/// State whose services fail the test if called.
pub(crate) fn strict_state() -> State {
    State {
        books: Arc::new(strict_books_mock()),
        carts: Arc::new(strict_carts_mock()),
        orders: Arc::new(strict_orders_mock()),
        reviews: Arc::new(strict_reviews_mock()),
        auth: Arc::new(strict_auth_mock()),
    }
}

pub(crate) fn state_with_auth(auth: MockAuthService) -> Arc<State> {
    Arc::new(State {
        auth: Arc::new(auth),
        ..strict_state()
    })
}

/// Serve `route` with `state`, acting as `principal` when given.
pub(crate) fn service(state: State, principal: Option<Principal>, route: Router) -> Service {
    let mut router = Router::new().hoop(inject(Arc::new(state)));

    if let Some(principal) = principal {
        router = router.hoop(InjectPrincipal(principal));
    }

    Service::new(router.push(route))
}

pub(crate) fn books_service(
    books: MockBooksService,
    principal: Option<Principal>,
    route: Router,
) -> Service {
    service(
        State {
            books: Arc::new(books),
            ..strict_state()
        },
        principal,
        route,
    )
}

pub(crate) fn carts_service(
    carts: MockCartsService,
    principal: Option<Principal>,
    route: Router,
) -> Service {
    service(
        State {
            carts: Arc::new(carts),
            ..strict_state()
        },
        principal,
        route,
    )
}

pub(crate) fn orders_service(
    orders: MockOrdersService,
    principal: Option<Principal>,
    route: Router,
) -> Service {
    service(
        State {
            orders: Arc::new(orders),
            ..strict_state()
        },
        principal,
        route,
    )
}

pub(crate) fn reviews_service(
    reviews: MockReviewsService,
    principal: Option<Principal>,
    route: Router,
) -> Service {
    service(
        State {
            reviews: Arc::new(reviews),
            ..strict_state()
        },
        principal,
        route,
    )
}
