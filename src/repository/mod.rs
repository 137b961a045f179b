//! Repository layer for database operations
//!
//! Handlers and services only see the [`BookStore`] and [`UserStore`] traits;
//! [`Repository`] implements them over a PostgreSQL pool.

pub mod books;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use thiserror::Error;

use crate::{
    config::DatabaseConfig,
    models::{
        book::{Book, BookChanges, NewBook},
        user::{NewUser, UserRecord},
    },
};

/// Errors raised by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// No connection could be obtained
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Query failed during execution
    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::UniqueViolation(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::Query(e.to_string()),
        }
    }
}

/// Persistence of books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a book and return the stored row
    async fn insert(&self, book: &NewBook) -> Result<Book, StoreError>;

    /// All books, ordered by id
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: i32) -> Result<Option<Book>, StoreError>;

    /// Apply `changes` to book `id`; `None` when no such book exists
    async fn update(&self, id: i32, changes: &BookChanges) -> Result<Option<Book>, StoreError>;

    /// Delete book `id`; `false` when no row was removed
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;
}

/// Persistence of user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Any user holding either `username` or `email`
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a user; a duplicate username or email yields [`StoreError::UniqueViolation`]
    async fn insert(&self, user: &NewUser) -> Result<UserRecord, StoreError>;
}

/// A complete store backing the whole API
#[async_trait]
pub trait Store: BookStore + UserStore + 'static {
    /// Check connectivity
    async fn ping(&self) -> Result<(), StoreError>;
}

/// PostgreSQL store holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Open a pool using the configured limits
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Store for Repository {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
