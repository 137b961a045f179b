//! Book collection endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::book::{Book, BookRequest},
    validation, AppState,
};

/// Response to a successful create
#[derive(Serialize, ToSchema)]
pub struct BookCreatedResponse {
    pub message: String,
    pub book: Book,
}

/// Whole collection
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub data: Vec<Book>,
}

/// Single book
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub data: Book,
}

/// Response to a successful update
#[derive(Serialize, ToSchema)]
pub struct BookUpdatedResponse {
    pub message: String,
    pub data: Book,
}

/// Plain confirmation message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Add a book to the collection
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookCreatedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    let input = validation::book(&body)?;

    let book = state.services.books.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book added to collection".to_string(),
            book,
        }),
    ))
}

/// List every book
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = BookListResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<BookListResponse>> {
    let data = state.services.books.list().await?;
    Ok(Json(BookListResponse { data }))
}

/// Get a book by id
#[utoipa::path(
    get,
    path = "/books/{bookid}",
    tag = "books",
    params(
        ("bookid" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 400, description = "Invalid book id", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(bookid): Path<String>,
) -> AppResult<Json<BookResponse>> {
    let id = validation::book_id(&bookid)?;

    let data = state.services.books.get(id).await?;
    Ok(Json(BookResponse { data }))
}

/// Replace a book's title and author
#[utoipa::path(
    put,
    path = "/books/{bookid}",
    tag = "books",
    params(
        ("bookid" = i32, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookUpdatedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(bookid): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<Value>, AppError>,
) -> AppResult<Json<BookUpdatedResponse>> {
    let (id, input) = validation::book_update(&bookid, &body)?;

    let data = state.services.books.update(id, input).await?;
    Ok(Json(BookUpdatedResponse {
        message: "Book updated successfully".to_string(),
        data,
    }))
}

/// Remove a book
#[utoipa::path(
    delete,
    path = "/books/{bookid}",
    tag = "books",
    params(
        ("bookid" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 400, description = "Invalid book id", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(bookid): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = validation::book_id(&bookid)?;

    state.services.books.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
