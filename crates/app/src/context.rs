//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db, PoolSettings},
    domain::{
        books::{BooksService, PgBooksService},
        carts::{CartsService, PgCartsService},
        orders::{OrdersService, PgOrdersService},
        reviews::{PgReviewsService, ReviewsService},
        users::{PgUsersService, UsersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub books: Arc<dyn BooksService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub reviews: Arc<dyn ReviewsService>,
    pub users: Arc<dyn UsersService>,
    pub auth: Arc<dyn AuthService>,
    db: Db,
}

impl AppContext {
    /// Wire every service to one shared pool.
    #[must_use]
    pub fn new(db: &Db) -> Self {
        Self {
            books: Arc::new(PgBooksService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            reviews: Arc::new(PgReviewsService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db.clone())),
            auth: Arc::new(PgAuthService::new(db.pool().clone())),
            db: db.clone(),
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or applying
    /// migrations fails.
    pub async fn from_database_url(
        url: &str,
        settings: PoolSettings,
        run_migrations: bool,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect_with(url, settings)
            .await
            .map_err(AppInitError::Database)?;

        if run_migrations {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;
        }

        Ok(Self::new(&Db::new(pool)))
    }

    /// Drain and close the connection pool.
    pub async fn close(&self) {
        self.db.close().await;
    }
}
