//! # scout-store
//!
//! Local SQLite persistence for the Scout2Retire chat core.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for messages,
//! read markers, favorites, moderation lists, the friend/group/town
//! directory and onboarding answers. Domain types come from
//! `scout-shared`.

pub mod database;
pub mod directory;
pub mod favorites;
pub mod messages;
pub mod migrations;
pub mod moderation;
pub mod onboarding;
pub mod threads;

mod error;
mod rows;

pub use database::Database;
pub use error::{Result, StoreError};
