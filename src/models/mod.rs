//! Data models for the bookshelf API

pub mod book;
pub mod user;
