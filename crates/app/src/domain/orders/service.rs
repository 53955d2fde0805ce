//! Orders service.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    auth::Principal,
    database::Db,
    domain::{
        books::{PgBooksRepository, records::BookUuid},
        carts::{PgCartItemsRepository, PgCartsRepository, records::CartOwner},
        orders::{
            data::{NewOrder, NewOrderLine, OrderPlacement, OrderQuery, StatusUpdate},
            errors::OrdersServiceError,
            records::{OrderItemUuid, OrderRecord, OrderStatus, OrderUuid},
            repositories::{
                NewOrderItem, NewOrderRow, OrderVisibility, PgOrderHistoryRepository,
                PgOrderItemsRepository, PgOrdersRepository, StatusWrite,
            },
        },
        pricing::{PriceBreakdown, PricedLine},
        stock::{PgStockReconciler, ReconcileError, StockChange, StockError},
        users::records::Role,
    },
};

const ORDER_PLACED_NOTE: &str = "Order placed";

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    history_repository: PgOrderHistoryRepository,
    books_repository: PgBooksRepository,
    carts_repository: PgCartsRepository,
    cart_items_repository: PgCartItemsRepository,
    reconciler: PgStockReconciler,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            history_repository: PgOrderHistoryRepository::new(),
            books_repository: PgBooksRepository::new(),
            carts_repository: PgCartsRepository::new(),
            cart_items_repository: PgCartItemsRepository::new(),
            reconciler: PgStockReconciler::new(),
        }
    }

    /// Attach items and status history to bare order rows.
    async fn hydrate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut orders: Vec<OrderRecord>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let mut items: HashMap<OrderUuid, Vec<_>> = HashMap::new();
        for row in self.items_repository.get_order_items(tx, &uuids).await? {
            items.entry(row.order_uuid).or_default().push(row.item);
        }

        let mut history: HashMap<OrderUuid, Vec<_>> = HashMap::new();
        for row in self.history_repository.get_status_history(tx, &uuids).await? {
            history.entry(row.order_uuid).or_default().push(row.change);
        }

        for order in &mut orders {
            order.items = items.remove(&order.uuid).unwrap_or_default();
            order.history = history.remove(&order.uuid).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn hydrate_one(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderRecord,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.hydrate(tx, vec![order])
            .await?
            .pop()
            .ok_or(OrdersServiceError::NotFound)
    }

    /// Restore stock for every line of a cancelled order, in uuid order.
    async fn return_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
    ) -> Result<(), OrdersServiceError> {
        let mut lines: Vec<_> = order
            .items
            .iter()
            .map(|item| (item.book_uuid, item.quantity))
            .collect();
        lines.sort_unstable_by_key(|(book, _)| *book);

        for (book, quantity) in lines {
            self.reconciler
                .adjust(tx, book, StockChange::return_to_stock(quantity))
                .await
                .map_err(|error| checkout_error(book, error))?;
        }

        Ok(())
    }
}

/// Sum duplicate lines per book. The map iterates in lock order.
fn combine_lines(lines: &[NewOrderLine]) -> Result<BTreeMap<BookUuid, u32>, OrdersServiceError> {
    if lines.is_empty() {
        return Err(OrdersServiceError::EmptyOrder);
    }

    let mut combined = BTreeMap::new();

    for line in lines {
        if line.quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity { book: line.book });
        }

        let quantity: &mut u32 = combined.entry(line.book).or_default();
        *quantity = quantity
            .checked_add(line.quantity)
            .ok_or(OrdersServiceError::InvalidQuantity { book: line.book })?;
    }

    Ok(combined)
}

fn checkout_error(book: BookUuid, error: ReconcileError) -> OrdersServiceError {
    match error {
        ReconcileError::NotFound => OrdersServiceError::BookUnavailable { book },
        ReconcileError::Stock(StockError::Insufficient {
            requested,
            available,
        }) => OrdersServiceError::InsufficientStock {
            book,
            requested,
            available,
        },
        ReconcileError::Stock(_) => OrdersServiceError::InvalidData,
        ReconcileError::Sql(error) => OrdersServiceError::from(error),
    }
}

/// Buyers read their own orders, sellers also those containing their books.
fn can_view(actor: &Principal, order: &OrderRecord) -> bool {
    actor.is_admin() || order.user_uuid == actor.user || order.involves_seller(actor.user)
}

/// Staff who may move an order through fulfilment.
fn can_fulfil(actor: &Principal, order: &OrderRecord) -> bool {
    actor.is_admin() || (actor.role == Role::Seller && order.involves_seller(actor.user))
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, actor, order),
        fields(order_uuid = %order.uuid, user_uuid = %actor.user, items = order.items.len()),
        err
    )]
    async fn create_order(
        &self,
        actor: Principal,
        order: NewOrder,
    ) -> Result<OrderPlacement, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        if let Some(key) = &order.idempotency_key {
            self.orders_repository
                .lock_idempotency_key(&mut tx, actor.user, key)
                .await?;
        }

        if let Some(key) = &order.idempotency_key
            && let Some(existing) = self
                .orders_repository
                .find_order_by_idempotency_key(&mut tx, actor.user, key)
                .await?
        {
            let existing = self.hydrate_one(&mut tx, existing).await?;

            tx.commit().await?;

            tracing::info!(order_uuid = %existing.uuid, "replaying idempotent checkout");

            return Ok(OrderPlacement::Replayed(existing));
        }

        let lines = combine_lines(&order.items)?;
        let book_uuids: Vec<BookUuid> = lines.keys().copied().collect();

        let books: HashMap<BookUuid, _> = self
            .books_repository
            .lock_books(&mut tx, &book_uuids)
            .await?
            .into_iter()
            .map(|book| (book.uuid, book))
            .collect();

        let mut priced = Vec::with_capacity(lines.len());
        let mut snapshots = Vec::with_capacity(lines.len());

        for (&book_uuid, &quantity) in &lines {
            let book = books
                .get(&book_uuid)
                .filter(|book| book.is_purchasable())
                .ok_or(OrdersServiceError::BookUnavailable { book: book_uuid })?;

            if book.stock < quantity {
                return Err(OrdersServiceError::InsufficientStock {
                    book: book_uuid,
                    requested: u64::from(quantity),
                    available: book.stock,
                });
            }

            let line = PricedLine {
                unit_price: book.price,
                quantity,
            };

            snapshots.push(NewOrderItem {
                uuid: OrderItemUuid::new(),
                book_uuid,
                seller_uuid: book.seller_uuid,
                title: book.title.clone(),
                quantity,
                unit_price: book.price,
                line_total: line.line_total()?,
            });
            priced.push(line);
        }

        let totals = PriceBreakdown::calculate(&priced, 0)?;
        let billing_address = order
            .billing_address
            .as_ref()
            .unwrap_or(&order.shipping_address);

        let created = self
            .orders_repository
            .create_order(
                &mut tx,
                NewOrderRow {
                    uuid: order.uuid,
                    user_uuid: actor.user,
                    totals,
                    shipping_address: &order.shipping_address,
                    billing_address,
                    payment_method: order.payment_method,
                    idempotency_key: order.idempotency_key.as_ref(),
                },
            )
            .await?;

        let Some(created) = created else {
            // A concurrent checkout with the same key committed first.
            let winner = match &order.idempotency_key {
                Some(key) => {
                    self.orders_repository
                        .find_order_by_idempotency_key(&mut tx, actor.user, key)
                        .await?
                }
                None => None,
            }
            .ok_or(OrdersServiceError::AlreadyExists)?;

            let winner = self.hydrate_one(&mut tx, winner).await?;

            tx.rollback().await?;

            return Ok(OrderPlacement::Replayed(winner));
        };

        for (position, snapshot) in (0_u32..).zip(snapshots) {
            self.items_repository
                .create_order_item(&mut tx, created.uuid, position, snapshot)
                .await?;
        }

        self.history_repository
            .record_status_change(
                &mut tx,
                created.uuid,
                OrderStatus::Pending,
                Some(ORDER_PLACED_NOTE),
                Some(actor.user),
            )
            .await?;

        for (&book, &quantity) in &lines {
            self.reconciler
                .adjust(&mut tx, book, StockChange::sale(quantity))
                .await
                .map_err(|error| checkout_error(book, error))?;
        }

        if order.clear_cart
            && let Some(cart) = self
                .carts_repository
                .lock_cart(&mut tx, &CartOwner::User(actor.user))
                .await?
        {
            self.cart_items_repository
                .clear_cart_items(&mut tx, cart.uuid)
                .await?;
        }

        let created = self.hydrate_one(&mut tx, created).await?;

        tx.commit().await?;

        Ok(OrderPlacement::Created(created))
    }

    async fn get_order(
        &self,
        actor: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders_repository.get_order(&mut tx, order).await?;
        let order = self.hydrate_one(&mut tx, order).await?;

        tx.commit().await?;

        if !can_view(&actor, &order) {
            return Err(OrdersServiceError::Forbidden);
        }

        Ok(order)
    }

    async fn list_orders(
        &self,
        actor: Principal,
        query: OrderQuery,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let visibility = match actor.role {
            Role::Admin => OrderVisibility::All,
            Role::Seller => OrderVisibility::PlacedOrSoldBy(actor.user),
            Role::Buyer => OrderVisibility::PlacedBy(actor.user),
        };

        let mut tx = self.db.begin_transaction().await?;

        let orders = self
            .orders_repository
            .list_orders(&mut tx, visibility, &query)
            .await?;
        let orders = self.hydrate(&mut tx, orders).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self, actor, update),
        fields(order_uuid = %order, actor_uuid = %actor.user, status = %update.status),
        err
    )]
    async fn update_status(
        &self,
        actor: Principal,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders_repository.lock_order(&mut tx, order).await?;
        let current = self.hydrate_one(&mut tx, current).await?;

        if !can_fulfil(&actor, &current) {
            return Err(OrdersServiceError::Forbidden);
        }

        if update.status == OrderStatus::Cancelled {
            tx.rollback().await?;

            return self.cancel(actor, order, update.note).await;
        }

        if !current.status.can_transition_to(update.status) {
            return Err(OrdersServiceError::InvalidTransition {
                from: current.status,
                to: update.status,
            });
        }

        let payment_status = current
            .payment_status
            .after(current.payment_method, update.status);

        let updated = self
            .orders_repository
            .update_order_status(
                &mut tx,
                order,
                StatusWrite {
                    status: update.status,
                    payment_status,
                    tracking_number: update.tracking_number,
                    cancel_reason: None,
                },
            )
            .await?;

        self.history_repository
            .record_status_change(
                &mut tx,
                order,
                update.status,
                update.note.as_deref(),
                Some(actor.user),
            )
            .await?;

        let updated = self.hydrate_one(&mut tx, updated).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.cancel",
        skip(self, actor, reason),
        fields(order_uuid = %order, actor_uuid = %actor.user),
        err
    )]
    async fn cancel(
        &self,
        actor: Principal,
        order: OrderUuid,
        reason: Option<String>,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders_repository.lock_order(&mut tx, order).await?;
        let current = self.hydrate_one(&mut tx, current).await?;

        if !can_view(&actor, &current) {
            return Err(OrdersServiceError::Forbidden);
        }

        if !current.status.is_cancellable() {
            return Err(OrdersServiceError::NotCancellable {
                status: current.status,
            });
        }

        self.return_stock(&mut tx, &current).await?;

        let payment_status = current
            .payment_status
            .after(current.payment_method, OrderStatus::Cancelled);

        let updated = self
            .orders_repository
            .update_order_status(
                &mut tx,
                order,
                StatusWrite {
                    status: OrderStatus::Cancelled,
                    payment_status,
                    tracking_number: None,
                    cancel_reason: reason.clone(),
                },
            )
            .await?;

        self.history_repository
            .record_status_change(
                &mut tx,
                order,
                OrderStatus::Cancelled,
                reason.as_deref(),
                Some(actor.user),
            )
            .await?;

        let updated = self.hydrate_one(&mut tx, updated).await?;

        tx.commit().await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Check out: reserve stock, snapshot prices, and place the order in one
    /// transaction. Replays the earlier order when the idempotency key was seen.
    async fn create_order(
        &self,
        actor: Principal,
        order: NewOrder,
    ) -> Result<OrderPlacement, OrdersServiceError>;

    /// Retrieve an order visible to the actor.
    async fn get_order(
        &self,
        actor: Principal,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// List orders visible to the actor, newest first.
    async fn list_orders(
        &self,
        actor: Principal,
        query: OrderQuery,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Move an order along the fulfilment chain.
    async fn update_status(
        &self,
        actor: Principal,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Cancel a pending or confirmed order, returning its stock.
    async fn cancel(
        &self,
        actor: Principal,
        order: OrderUuid,
        reason: Option<String>,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use crate::{
        domain::{
            books::{BooksService, records::BookStatus},
            carts::CartsService,
            orders::{
                data::IdempotencyKey,
                records::{PaymentMethod, PaymentStatus},
            },
            reviews::ReviewsService,
        },
        test::{
            TestContext,
            helpers::{new_order, new_review},
        },
    };

    use super::*;

    #[tokio::test]
    async fn checkout_of_five_ten_dollar_books_prices_and_reserves_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let placement = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 5)]))
            .await?;

        assert!(!placement.is_replay());

        let order = placement.into_order();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(
            order.totals,
            PriceBreakdown {
                subtotal: 50_00,
                tax: 4_00,
                shipping: 0,
                discount: 0,
                total: 54_00,
            }
        );
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].unit_price, 10_00);
        assert_eq!(order.items[0].line_total, 50_00);
        assert_eq!(order.items[0].seller_uuid, ctx.seller);
        assert_eq!(order.history.len(), 1);
        assert_eq!(order.history[0].status, OrderStatus::Pending);
        assert_eq!(order.billing_address, order.shipping_address);

        let book = ctx.books.get_book(book).await?;

        assert_eq!(book.stock, 0);
        assert_eq!(book.sales_count, 5);
        assert_eq!(book.status, BookStatus::OutOfStock);

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_restores_stock_and_records_history() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 5)]))
            .await?
            .into_order();

        let cancelled = ctx
            .orders
            .cancel(
                ctx.buyer_principal(),
                order.uuid,
                Some("changed mind".to_string()),
            )
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("changed mind"));
        assert_eq!(cancelled.history.len(), 2);
        assert_eq!(cancelled.history[1].status, OrderStatus::Cancelled);
        assert_eq!(cancelled.history[1].note.as_deref(), Some("changed mind"));

        let book = ctx.books.get_book(book).await?;

        assert_eq!(book.stock, 5);
        assert_eq!(book.sales_count, 0);
        assert_eq!(book.status, BookStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_after_the_book_was_deleted_keeps_it_delisted() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 1).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 1)]))
            .await?
            .into_order();

        ctx.books.delete_book(ctx.seller_principal(), book).await?;
        ctx.orders
            .cancel(ctx.buyer_principal(), order.uuid, None)
            .await?;

        let (stock, status): (i32, String) =
            sqlx::query_as("SELECT stock, status FROM books WHERE uuid = $1")
                .bind(book)
                .fetch_one(ctx.db.pool())
                .await?;

        assert_eq!(stock, 1);
        assert_eq!(status.parse::<BookStatus>()?, BookStatus::Inactive);

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_twice_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 2)]))
            .await?
            .into_order();

        ctx.orders
            .cancel(ctx.buyer_principal(), order.uuid, None)
            .await?;

        let result = ctx
            .orders
            .cancel(ctx.buyer_principal(), order.uuid, None)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::NotCancellable {
                    status: OrderStatus::Cancelled
                })
            ),
            "expected NotCancellable, got {result:?}"
        );
        assert_eq!(ctx.books.get_book(book).await?.stock, 5, "stock restored once");

        Ok(())
    }

    #[tokio::test]
    async fn checkout_rejects_more_than_in_stock_without_side_effects() -> TestResult {
        let ctx = TestContext::new().await;
        let plenty = ctx.create_book("Dune", 10_00, 10).await;
        let scarce = ctx.create_book("Emma", 8_00, 1).await;

        let result = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(plenty, 3), (scarce, 2)]))
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InsufficientStock {
                    requested: 2,
                    available: 1,
                    ..
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(ctx.books.get_book(plenty).await?.stock, 10);
        assert!(
            ctx.orders
                .list_orders(ctx.buyer_principal(), OrderQuery::default())
                .await?
                .is_empty()
        );

        Ok(())
    }

    #[tokio::test]
    async fn checkout_rejects_empty_and_unavailable_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 3).await;

        ctx.books.delete_book(ctx.seller_principal(), book).await?;

        let empty = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[]))
            .await;
        let unavailable = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 1)]))
            .await;
        let zero = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 0)]))
            .await;

        assert!(matches!(empty, Err(OrdersServiceError::EmptyOrder)));
        assert!(matches!(
            unavailable,
            Err(OrdersServiceError::BookUnavailable { .. })
        ));
        assert!(matches!(
            zero,
            Err(OrdersServiceError::InvalidQuantity { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_lines_are_combined() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 2), (book, 1)]))
            .await?
            .into_order();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(ctx.books.get_book(book).await?.stock, 2);

        Ok(())
    }

    #[tokio::test]
    async fn idempotent_retry_returns_the_original_order() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let key = IdempotencyKey::parse("checkout-0001-retry-safe")?;

        let mut first = new_order(&[(book, 2)]);
        first.idempotency_key = Some(key.clone());

        let mut retry = new_order(&[(book, 2)]);
        retry.idempotency_key = Some(key);

        let created = ctx
            .orders
            .create_order(ctx.buyer_principal(), first)
            .await?;
        let replayed = ctx
            .orders
            .create_order(ctx.buyer_principal(), retry)
            .await?;

        assert!(replayed.is_replay());
        assert_eq!(replayed.into_order().uuid, created.into_order().uuid);
        assert_eq!(ctx.books.get_book(book).await?.stock, 3, "stock taken once");

        Ok(())
    }

    #[tokio::test]
    async fn checkout_clears_the_cart_when_asked() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let owner = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(owner.clone(), book, 2).await?;

        let mut order = new_order(&[(book, 2)]);
        order.clear_cart = true;

        ctx.orders
            .create_order(ctx.buyer_principal(), order)
            .await?;

        assert!(ctx.carts.get_cart(owner).await?.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_checkouts_for_the_last_copy_sell_it_once() -> TestResult {
        let ctx = Arc::new(TestContext::new().await);
        let book = ctx.create_book("Dune", 10_00, 1).await;
        let other_buyer = ctx.create_user(Role::Buyer).await;

        let first = {
            let ctx = Arc::clone(&ctx);
            let actor = ctx.buyer_principal();
            tokio::spawn(async move { ctx.orders.create_order(actor, new_order(&[(book, 1)])).await })
        };

        let second = {
            let ctx = Arc::clone(&ctx);
            let actor = Principal {
                user: other_buyer,
                role: Role::Buyer,
            };
            tokio::spawn(async move { ctx.orders.create_order(actor, new_order(&[(book, 1)])).await })
        };

        let results = [first.await?, second.await?];
        let successes = results.iter().filter(|result| result.is_ok()).count();

        assert_eq!(successes, 1, "exactly one checkout should win: {results:?}");
        assert!(results.iter().any(|result| matches!(
            result,
            Err(OrdersServiceError::InsufficientStock { .. }
                | OrdersServiceError::BookUnavailable { .. })
        )));

        let book = ctx.books.get_book(book).await?;

        assert_eq!(book.stock, 0);
        assert_eq!(book.sales_count, 1);
        assert_eq!(book.status, BookStatus::OutOfStock);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_retries_of_one_checkout_share_the_order() -> TestResult {
        let ctx = Arc::new(TestContext::new().await);
        let book = ctx.create_book("Dune", 10_00, 1).await;
        let key = IdempotencyKey::parse("checkout-0002-double-click")?;

        let attempts: Vec<_> = (0..2)
            .map(|_| {
                let ctx = Arc::clone(&ctx);
                let actor = ctx.buyer_principal();
                let mut order = new_order(&[(book, 1)]);
                order.idempotency_key = Some(key.clone());

                tokio::spawn(async move { ctx.orders.create_order(actor, order).await })
            })
            .collect();

        let mut placements = Vec::new();

        for attempt in attempts {
            placements.push(attempt.await??);
        }

        assert_eq!(
            placements.iter().filter(|placement| placement.is_replay()).count(),
            1,
            "one attempt places the order, the other replays it"
        );

        let uuids: Vec<OrderUuid> = placements
            .into_iter()
            .map(|placement| placement.into_order().uuid)
            .collect();

        assert_eq!(uuids[0], uuids[1]);

        let book = ctx.books.get_book(book).await?;

        assert_eq!(book.stock, 0);
        assert_eq!(book.sales_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn fulfilment_follows_the_transition_table() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let mut placed = new_order(&[(book, 1)]);
        placed.payment_method = PaymentMethod::CashOnDelivery;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), placed)
            .await?
            .into_order();

        let skip = ctx
            .orders
            .update_status(
                ctx.seller_principal(),
                order.uuid,
                StatusUpdate {
                    status: OrderStatus::Shipped,
                    note: None,
                    tracking_number: None,
                },
            )
            .await;

        assert!(
            matches!(
                skip,
                Err(OrdersServiceError::InvalidTransition {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Shipped,
                })
            ),
            "expected InvalidTransition, got {skip:?}"
        );

        let mut latest = order;

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            latest = ctx
                .orders
                .update_status(
                    ctx.seller_principal(),
                    latest.uuid,
                    StatusUpdate {
                        status,
                        note: None,
                        tracking_number: (status == OrderStatus::Shipped)
                            .then(|| "1Z999".to_string()),
                    },
                )
                .await?;
        }

        assert_eq!(latest.status, OrderStatus::Delivered);
        assert_eq!(latest.payment_status, PaymentStatus::Paid);
        assert_eq!(latest.tracking_number.as_deref(), Some("1Z999"));
        assert_eq!(latest.history.len(), 5);

        let late_cancel = ctx
            .orders
            .cancel(ctx.buyer_principal(), latest.uuid, None)
            .await;

        assert!(matches!(
            late_cancel,
            Err(OrdersServiceError::NotCancellable {
                status: OrderStatus::Delivered
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_a_paid_order_refunds_it() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 1)]))
            .await?
            .into_order();

        let confirmed = ctx
            .orders
            .update_status(
                ctx.admin_principal(),
                order.uuid,
                StatusUpdate {
                    status: OrderStatus::Confirmed,
                    note: None,
                    tracking_number: None,
                },
            )
            .await?;

        assert_eq!(confirmed.payment_status, PaymentStatus::Paid);

        let cancelled = ctx
            .orders
            .update_status(
                ctx.admin_principal(),
                order.uuid,
                StatusUpdate {
                    status: OrderStatus::Cancelled,
                    note: Some("fraud check failed".to_string()),
                    tracking_number: None,
                },
            )
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);

        Ok(())
    }

    #[tokio::test]
    async fn buyers_cannot_fulfil_or_read_other_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let stranger = ctx.create_user(Role::Buyer).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 1)]))
            .await?
            .into_order();

        let fulfil = ctx
            .orders
            .update_status(
                ctx.buyer_principal(),
                order.uuid,
                StatusUpdate {
                    status: OrderStatus::Confirmed,
                    note: None,
                    tracking_number: None,
                },
            )
            .await;

        let read = ctx
            .orders
            .get_order(
                Principal {
                    user: stranger,
                    role: Role::Buyer,
                },
                order.uuid,
            )
            .await;

        assert!(matches!(fulfil, Err(OrdersServiceError::Forbidden)));
        assert!(matches!(read, Err(OrdersServiceError::Forbidden)));

        let seller_view = ctx
            .orders
            .get_order(ctx.seller_principal(), order.uuid)
            .await?;

        assert_eq!(seller_view.uuid, order.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn only_staff_cancel_through_a_status_change() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        let order = ctx
            .orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 2)]))
            .await?
            .into_order();

        let cancel_via_status = |note: &str| StatusUpdate {
            status: OrderStatus::Cancelled,
            note: Some(note.to_string()),
            tracking_number: None,
        };

        let by_buyer = ctx
            .orders
            .update_status(ctx.buyer_principal(), order.uuid, cancel_via_status("mine"))
            .await;

        assert!(matches!(by_buyer, Err(OrdersServiceError::Forbidden)));
        assert_eq!(ctx.books.get_book(book).await?.stock, 3);

        let by_seller = ctx
            .orders
            .update_status(
                ctx.seller_principal(),
                order.uuid,
                cancel_via_status("cannot ship"),
            )
            .await?;

        assert_eq!(by_seller.status, OrderStatus::Cancelled);
        assert_eq!(by_seller.cancel_reason.as_deref(), Some("cannot ship"));
        assert_eq!(ctx.books.get_book(book).await?.stock, 5);

        Ok(())
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let other_buyer = ctx.create_user(Role::Buyer).await;

        ctx.orders
            .create_order(ctx.buyer_principal(), new_order(&[(book, 1)]))
            .await?;
        ctx.orders
            .create_order(
                Principal {
                    user: other_buyer,
                    role: Role::Buyer,
                },
                new_order(&[(book, 1)]),
            )
            .await?;

        let mine = ctx
            .orders
            .list_orders(ctx.buyer_principal(), OrderQuery::default())
            .await?;
        let sold = ctx
            .orders
            .list_orders(ctx.seller_principal(), OrderQuery::default())
            .await?;
        let all = ctx
            .orders
            .list_orders(
                ctx.admin_principal(),
                OrderQuery {
                    status: Some(OrderStatus::Pending),
                    ..OrderQuery::default()
                },
            )
            .await?;

        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_uuid, ctx.buyer);
        assert_eq!(mine[0].items.len(), 1);
        assert_eq!(sold.len(), 2);
        assert_eq!(all.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn purchase_marks_later_review_as_verified() -> TestResult {
        let ctx = TestContext::new().await;
        let bought = ctx.create_book("Dune", 10_00, 5).await;
        let browsed = ctx.create_book("Emma", 8_00, 5).await;

        ctx.orders
            .create_order(ctx.buyer_principal(), new_order(&[(bought, 1)]))
            .await?;

        let verified = ctx
            .reviews
            .create_review(ctx.buyer_principal(), new_review(bought, 5))
            .await?;
        let unverified = ctx
            .reviews
            .create_review(ctx.buyer_principal(), new_review(browsed, 3))
            .await?;

        assert!(verified.verified);
        assert!(!unverified.verified);

        Ok(())
    }
}
