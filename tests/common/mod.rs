//! Shared helpers: in-memory stores and an in-process router

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use bookshelf_server::{
    api,
    config::{AppConfig, AuthConfig},
    models::{
        book::{Book, BookChanges, NewBook},
        user::{NewUser, UserRecord},
    },
    repository::{BookStore, Store, StoreError, UserStore},
    services::Services,
    AppState,
};

pub const SECRET: &str = "integration-secret";

#[derive(Default)]
struct Tables {
    books: Vec<Book>,
    users: Vec<UserRecord>,
    next_book_id: i32,
    next_user_id: i32,
}

/// Store keeping rows in memory, enforcing the same unique keys as the schema
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn book_count(&self) -> usize {
        self.tables.lock().unwrap().books.len()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn insert(&self, book: &NewBook) -> Result<Book, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_book_id += 1;
        let row = Book {
            id: tables.next_book_id,
            title: book.title.clone(),
            author: book.author.clone(),
            created_at: book.created_at,
            updated_at: book.updated_at,
        };
        tables.books.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.tables.lock().unwrap().books.clone())
    }

    async fn get(&self, id: i32) -> Result<Option<Book>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.books.iter().find(|b| b.id == id).cloned())
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> Result<Option<Book>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.books.iter_mut().find(|b| b.id == id).map(|book| {
            book.title = changes.title.clone();
            book.author = changes.author.clone();
            book.updated_at = book.updated_at.max(changes.updated_at);
            book.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.books.len();
        tables.books.retain(|b| b.id != id);
        Ok(tables.books.len() < before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn insert(&self, user: &NewUser) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::UniqueViolation("users_username_key".to_string()));
        }
        tables.next_user_id += 1;
        let row = UserRecord {
            id: tables.next_user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        };
        tables.users.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store whose every call fails as if the database were down
pub struct DownStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable(
        "pool timed out while waiting for an open connection".to_string(),
    ))
}

#[async_trait]
impl BookStore for DownStore {
    async fn insert(&self, _book: &NewBook) -> Result<Book, StoreError> {
        down()
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        down()
    }

    async fn get(&self, _id: i32) -> Result<Option<Book>, StoreError> {
        down()
    }

    async fn update(&self, _id: i32, _changes: &BookChanges) -> Result<Option<Book>, StoreError> {
        down()
    }

    async fn delete(&self, _id: i32) -> Result<bool, StoreError> {
        down()
    }
}

#[async_trait]
impl UserStore for DownStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<UserRecord>, StoreError> {
        down()
    }

    async fn find_by_username_or_email(
        &self,
        _username: &str,
        _email: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        down()
    }

    async fn insert(&self, _user: &NewUser) -> Result<UserRecord, StoreError> {
        down()
    }
}

#[async_trait]
impl Store for DownStore {
    async fn ping(&self) -> Result<(), StoreError> {
        down()
    }
}

/// Router over `store`, configured with the test secret
pub fn app_with<S: Store>(store: Arc<S>) -> Router {
    let config = AppConfig {
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
        },
        ..Default::default()
    };
    let services = Services::new(store, config.auth.clone());
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Router over a fresh in-memory store
pub fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (app_with(store.clone()), store)
}

/// Send one request and decode the JSON response
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_token(app, method, uri, body, None).await
}

pub async fn send_with_token(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
