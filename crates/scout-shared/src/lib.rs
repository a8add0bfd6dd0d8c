//! # scout-shared
//!
//! Domain types shared by every Scout2Retire crate: identifiers, the closed
//! [`Thread`](thread::Thread) union, chat messages, favorites, directory
//! records and onboarding steps.

pub mod constants;
pub mod error;
pub mod models;
pub mod onboarding;
pub mod thread;
pub mod types;

pub use error::SharedError;
