//! Book collection service

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, BookInput, NewBook},
    repository::BookStore,
};

#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("bookid: {} not found", id))
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Stamp creation time and store a new book
    pub async fn create(&self, input: BookInput) -> AppResult<Book> {
        let book = self
            .store
            .insert(&NewBook::stamped(input, Utc::now()))
            .await
            .map_err(AppError::database("Server could not add book into collection"))?;

        tracing::info!(book_id = book.id, "Book created");
        Ok(book)
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.store
            .list()
            .await
            .map_err(AppError::database("Server could not find the collection"))
    }

    pub async fn get(&self, id: i32) -> AppResult<Book> {
        self.store
            .get(id)
            .await
            .map_err(AppError::database("Server could not get the book"))?
            .ok_or_else(|| not_found(id))
    }

    /// Replace title and author; a missing id is reported as not found
    pub async fn update(&self, id: i32, input: BookInput) -> AppResult<Book> {
        let changes = BookChanges {
            title: input.title,
            author: input.author,
            updated_at: Utc::now(),
        };

        let book = self
            .store
            .update(id, &changes)
            .await
            .map_err(AppError::database("Server could not update book"))?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(book_id = id, "Book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let deleted = self
            .store
            .delete(id)
            .await
            .map_err(AppError::database("Server could not delete book"))?;

        if !deleted {
            return Err(not_found(id));
        }

        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }
}
