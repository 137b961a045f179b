//! Business logic services

pub mod auth;
pub mod books;

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    repository::Store,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub books: books::BookService,
    pub auth: auth::AuthService,
    store: Arc<dyn Store>,
}

impl Services {
    /// Create all services over the given store
    pub fn new<S: Store>(store: Arc<S>, auth_config: AuthConfig) -> Self {
        Self {
            books: books::BookService::new(store.clone()),
            auth: auth::AuthService::new(store.clone(), auth_config),
            store,
        }
    }

    /// Check that the store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.store
            .ping()
            .await
            .map_err(|e| AppError::Unavailable(e.to_string()))
    }
}
