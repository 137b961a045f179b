//! Books table

use async_trait::async_trait;

use super::{BookStore, Repository, StoreError};
use crate::models::book::{Book, BookChanges, NewBook};

#[async_trait]
impl BookStore for Repository {
    async fn insert(&self, book: &NewBook) -> Result<Book, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, author, created_at, updated_at
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.created_at)
        .bind(book.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let rows = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, created_at, updated_at FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Book>, StoreError> {
        let row = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, created_at, updated_at FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> Result<Option<Book>, StoreError> {
        // GREATEST keeps updated_at from moving backwards under clock skew
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1,
                author = $2,
                updated_at = GREATEST($3, updated_at)
            WHERE id = $4
            RETURNING id, title, author, created_at, updated_at
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(changes.updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
