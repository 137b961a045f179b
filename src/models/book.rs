//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Book record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Advanced on every successful update
    pub updated_at: DateTime<Utc>,
}

/// Create/update book request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRequest {
    /// Book title (max 150 characters)
    #[schema(example = "1984")]
    pub title: String,
    /// Book author (max 150 characters)
    #[schema(example = "George Orwell")]
    pub author: String,
}

/// Validated and sanitized book fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
}

/// Row to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewBook {
    pub fn stamped(input: BookInput, now: DateTime<Utc>) -> Self {
        Self {
            title: input.title,
            author: input.author,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields changed by an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub updated_at: DateTime<Utc>,
}
