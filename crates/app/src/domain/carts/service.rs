//! Carts service.

use std::collections::HashMap;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        books::{
            PgBooksRepository,
            records::{BookRecord, BookUuid},
        },
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            records::{CartIssue, CartItemUuid, CartOwner, CartRecord, SessionId},
            repositories::{PgCartItemsRepository, PgCartsRepository, StoredCart},
            rules::{check_book_line, check_line_quantity, line_issues, merged_quantity},
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
    books_repository: PgBooksRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
            books_repository: PgBooksRepository::new(),
        }
    }

    async fn load_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: StoredCart,
    ) -> Result<CartRecord, sqlx::Error> {
        let items = self.items_repository.get_cart_items(tx, cart.uuid).await?;

        Ok(CartRecord {
            uuid: Some(cart.uuid),
            owner: cart.owner,
            items,
            updated_at: Some(cart.updated_at),
        })
    }

    async fn find_book_for_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: BookUuid,
    ) -> Result<BookRecord, CartsServiceError> {
        self.books_repository
            .find_book(tx, book)
            .await?
            .ok_or(CartsServiceError::BookUnavailable { book })
    }

    async fn books_by_uuid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        books: &[BookUuid],
    ) -> Result<HashMap<BookUuid, BookRecord>, sqlx::Error> {
        let books = self.books_repository.get_books(tx, books).await?;

        Ok(books.into_iter().map(|book| (book.uuid, book)).collect())
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, owner: CartOwner) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = match self.carts_repository.find_cart(&mut tx, &owner).await? {
            Some(cart) => self.load_cart(&mut tx, cart).await?,
            None => CartRecord::empty(owner),
        };

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, owner),
        fields(cart_owner = %owner, book_uuid = %book),
        err
    )]
    async fn add_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError> {
        check_line_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let record = self.find_book_for_cart(&mut tx, book).await?;
        let cart = self.carts_repository.ensure_cart(&mut tx, &owner).await?;

        let existing = self
            .items_repository
            .get_cart_items(&mut tx, cart.uuid)
            .await?
            .into_iter()
            .find(|item| item.book_uuid == book);

        let combined = existing
            .as_ref()
            .map_or(quantity, |item| item.quantity.saturating_add(quantity));

        check_book_line(&record, combined)?;

        if existing.is_some() {
            self.items_repository
                .update_cart_item_quantity(&mut tx, cart.uuid, book, combined)
                .await?;
        } else {
            self.items_repository
                .create_cart_item(
                    &mut tx,
                    cart.uuid,
                    NewCartItem {
                        uuid: CartItemUuid::new(),
                        book_uuid: book,
                        quantity,
                        price: record.price,
                    },
                )
                .await?;
        }

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip(self, owner),
        fields(cart_owner = %owner, book_uuid = %book),
        err
    )]
    async fn update_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError> {
        if quantity == 0 {
            return self.remove_item(owner, book).await;
        }

        check_line_quantity(quantity)?;

        let mut tx = self.db.begin_transaction().await?;

        let cart = self
            .carts_repository
            .lock_cart(&mut tx, &owner)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let record = self.find_book_for_cart(&mut tx, book).await?;

        check_book_line(&record, quantity)?;

        self.items_repository
            .update_cart_item_quantity(&mut tx, cart.uuid, book, quantity)
            .await?;

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self, owner),
        fields(cart_owner = %owner, book_uuid = %book),
        err
    )]
    async fn remove_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self
            .carts_repository
            .lock_cart(&mut tx, &owner)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let rows_affected = self
            .items_repository
            .delete_cart_item(&mut tx, cart.uuid, book)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(name = "carts.service.clear", skip(self, owner), fields(cart_owner = %owner), err)]
    async fn clear(&self, owner: CartOwner) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let Some(cart) = self.carts_repository.lock_cart(&mut tx, &owner).await? else {
            return Ok(CartRecord::empty(owner));
        };

        self.items_repository
            .clear_cart_items(&mut tx, cart.uuid)
            .await?;

        self.carts_repository.touch_cart(&mut tx, cart.uuid).await?;

        let cart = self.load_cart(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.merge",
        skip(self, session),
        fields(session_id = %session, user_uuid = %user),
        err
    )]
    async fn merge(
        &self,
        session: SessionId,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let session_owner = CartOwner::Session(session);
        let user_owner = CartOwner::User(user);

        let user_cart = self.carts_repository.ensure_cart(&mut tx, &user_owner).await?;

        let Some(session_cart) = self
            .carts_repository
            .lock_cart(&mut tx, &session_owner)
            .await?
        else {
            let cart = self.load_cart(&mut tx, user_cart).await?;

            tx.commit().await?;

            return Ok(cart);
        };

        let session_items = self
            .items_repository
            .get_cart_items(&mut tx, session_cart.uuid)
            .await?;

        let user_items: HashMap<BookUuid, u32> = self
            .items_repository
            .get_cart_items(&mut tx, user_cart.uuid)
            .await?
            .into_iter()
            .map(|item| (item.book_uuid, item.quantity))
            .collect();

        let book_uuids: Vec<BookUuid> = session_items.iter().map(|item| item.book_uuid).collect();
        let books = self.books_by_uuid(&mut tx, &book_uuids).await?;

        for item in session_items {
            let Some(book) = books.get(&item.book_uuid).filter(|book| book.is_purchasable())
            else {
                tracing::debug!(book_uuid = %item.book_uuid, "dropping unavailable line on merge");
                continue;
            };

            let existing = user_items.get(&item.book_uuid).copied();
            let quantity = merged_quantity(existing.unwrap_or(0), item.quantity, book.stock);

            if quantity == 0 {
                continue;
            }

            if existing.is_some() {
                self.items_repository
                    .update_cart_item_quantity(&mut tx, user_cart.uuid, item.book_uuid, quantity)
                    .await?;
            } else {
                self.items_repository
                    .create_cart_item(
                        &mut tx,
                        user_cart.uuid,
                        NewCartItem {
                            uuid: CartItemUuid::new(),
                            book_uuid: item.book_uuid,
                            quantity,
                            price: item.price,
                        },
                    )
                    .await?;
            }
        }

        self.carts_repository
            .delete_cart(&mut tx, session_cart.uuid)
            .await?;

        self.carts_repository
            .touch_cart(&mut tx, user_cart.uuid)
            .await?;

        let cart = self.load_cart(&mut tx, user_cart).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn validate(&self, owner: CartOwner) -> Result<Vec<CartIssue>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let Some(cart) = self.carts_repository.find_cart(&mut tx, &owner).await? else {
            return Ok(Vec::new());
        };

        let items = self
            .items_repository
            .get_cart_items(&mut tx, cart.uuid)
            .await?;

        let book_uuids: Vec<BookUuid> = items.iter().map(|item| item.book_uuid).collect();
        let books = self.books_by_uuid(&mut tx, &book_uuids).await?;

        tx.commit().await?;

        Ok(items
            .iter()
            .flat_map(|item| line_issues(item, books.get(&item.book_uuid)))
            .collect())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the owner's cart, empty when none exists yet.
    async fn get_cart(&self, owner: CartOwner) -> Result<CartRecord, CartsServiceError>;

    /// Add copies of a book, creating the cart on first use.
    async fn add_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Set a line's quantity. Zero removes the line.
    async fn update_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
        quantity: u32,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove a line.
    async fn remove_item(
        &self,
        owner: CartOwner,
        book: BookUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Remove every line.
    async fn clear(&self, owner: CartOwner) -> Result<CartRecord, CartsServiceError>;

    /// Fold a guest session cart into the user's cart and discard it.
    async fn merge(
        &self,
        session: SessionId,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Report lines that could not be checked out as-is.
    async fn validate(&self, owner: CartOwner) -> Result<Vec<CartIssue>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::books::{BooksService, data::BookUpdate},
        test::TestContext,
    };

    use super::*;

    fn session(id: &str) -> SessionId {
        SessionId::parse(id).expect("valid session id")
    }

    #[tokio::test]
    async fn get_cart_without_items_is_empty() -> TestResult {
        let ctx = TestContext::new().await;

        let cart = ctx.carts.get_cart(CartOwner::User(ctx.buyer)).await?;

        assert!(cart.uuid.is_none());
        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal(), Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn add_item_creates_cart_and_captures_price() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let owner = CartOwner::User(ctx.buyer);

        let cart = ctx.carts.add_item(owner.clone(), book, 2).await?;

        assert!(cart.uuid.is_some());
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].price, 10_00);
        assert_eq!(cart.subtotal(), Some(20_00));

        ctx.books
            .update_book(
                ctx.seller_principal(),
                book,
                BookUpdate {
                    price: Some(12_00),
                    ..BookUpdate::default()
                },
            )
            .await?;

        let cart = ctx.carts.add_item(owner, book, 1).await?;

        assert_eq!(cart.items.len(), 1, "adding again increments the line");
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].price, 10_00, "price snapshot is kept");

        Ok(())
    }

    #[tokio::test]
    async fn adding_exactly_the_stock_succeeds_and_one_more_fails() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 4).await;
        let owner = CartOwner::Session(session("guest-1"));

        ctx.carts.add_item(owner.clone(), book, 4).await?;

        let result = ctx.carts.add_item(owner, book, 1).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::OutOfStock {
                    requested: 5,
                    available: 4,
                })
            ),
            "expected OutOfStock, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn combined_quantity_cannot_exceed_ten() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 50).await;
        let owner = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(owner.clone(), book, 8).await?;

        let result = ctx.carts.add_item(owner, book, 3).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::QuantityOutOfRange { quantity: 11, .. })
            ),
            "expected QuantityOutOfRange, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn inactive_or_missing_books_cannot_be_added() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;

        ctx.books
            .update_book(
                ctx.seller_principal(),
                book,
                BookUpdate {
                    listed: Some(false),
                    ..BookUpdate::default()
                },
            )
            .await?;

        let inactive = ctx.carts.add_item(CartOwner::User(ctx.buyer), book, 1).await;
        let missing = ctx
            .carts
            .add_item(CartOwner::User(ctx.buyer), BookUuid::new(), 1)
            .await;

        assert!(
            matches!(inactive, Err(CartsServiceError::BookUnavailable { .. })),
            "expected BookUnavailable, got {inactive:?}"
        );
        assert!(
            matches!(missing, Err(CartsServiceError::BookUnavailable { .. })),
            "expected BookUnavailable, got {missing:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_item_to_zero_removes_the_line() -> TestResult {
        let ctx = TestContext::new().await;
        let dune = ctx.create_book("Dune", 10_00, 5).await;
        let emma = ctx.create_book("Emma", 8_00, 5).await;
        let owner = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(owner.clone(), dune, 1).await?;
        ctx.carts.add_item(owner.clone(), emma, 1).await?;

        let cart = ctx.carts.update_item(owner.clone(), dune, 3).await?;

        assert_eq!(cart.item(dune).map(|item| item.quantity), Some(3));

        let cart = ctx.carts.update_item(owner.clone(), dune, 0).await?;

        assert!(cart.item(dune).is_none());
        assert_eq!(cart.items.len(), 1);

        let result = ctx.carts.update_item(owner, dune, 2).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_the_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let owner = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(owner.clone(), book, 2).await?;

        let cart = ctx.carts.clear(owner.clone()).await?;

        assert!(cart.items.is_empty());
        assert!(ctx.carts.get_cart(owner).await?.items.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn merge_sums_quantities_capped_by_stock_and_drops_unavailable_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let shared = ctx.create_book("Dune", 10_00, 6).await;
        let guest_only = ctx.create_book("Emma", 8_00, 5).await;
        let delisted = ctx.create_book("Ulysses", 15_00, 5).await;
        let guest = session("guest-merge");
        let user = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(user.clone(), shared, 4).await?;
        ctx.carts
            .add_item(CartOwner::Session(guest.clone()), shared, 4)
            .await?;
        ctx.carts
            .add_item(CartOwner::Session(guest.clone()), guest_only, 2)
            .await?;
        ctx.carts
            .add_item(CartOwner::Session(guest.clone()), delisted, 1)
            .await?;

        ctx.books.delete_book(ctx.seller_principal(), delisted).await?;

        let cart = ctx.carts.merge(guest.clone(), ctx.buyer).await?;

        assert_eq!(cart.owner, user);
        assert_eq!(cart.item(shared).map(|item| item.quantity), Some(6));
        assert_eq!(cart.item(guest_only).map(|item| item.quantity), Some(2));
        assert!(cart.item(delisted).is_none());

        let guest_cart = ctx.carts.get_cart(CartOwner::Session(guest)).await?;

        assert!(guest_cart.uuid.is_none(), "session cart is deleted");

        Ok(())
    }

    #[tokio::test]
    async fn merge_without_session_cart_returns_user_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 6).await;

        ctx.carts
            .add_item(CartOwner::User(ctx.buyer), book, 1)
            .await?;

        let cart = ctx.carts.merge(session("nobody"), ctx.buyer).await?;

        assert_eq!(cart.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn validate_reports_price_and_stock_drift() -> TestResult {
        let ctx = TestContext::new().await;
        let book = ctx.create_book("Dune", 10_00, 5).await;
        let owner = CartOwner::User(ctx.buyer);

        ctx.carts.add_item(owner.clone(), book, 4).await?;

        assert!(ctx.carts.validate(owner.clone()).await?.is_empty());

        ctx.books
            .update_book(
                ctx.seller_principal(),
                book,
                BookUpdate {
                    price: Some(11_00),
                    ..BookUpdate::default()
                },
            )
            .await?;
        ctx.books
            .adjust_stock(ctx.seller_principal(), book, -3)
            .await?;

        let issues = ctx.carts.validate(owner.clone()).await?;

        assert_eq!(
            issues,
            vec![
                CartIssue::InsufficientStock {
                    book,
                    requested: 4,
                    available: 2,
                },
                CartIssue::PriceChanged {
                    book,
                    cart_price: 10_00,
                    current_price: 11_00,
                },
            ]
        );

        let cart = ctx.carts.get_cart(owner).await?;

        assert_eq!(cart.items[0].quantity, 4, "validate never mutates");

        Ok(())
    }
}
