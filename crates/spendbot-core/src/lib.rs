//! Core domain + application logic for the expense bot.
//!
//! This crate is intentionally transport-agnostic. Telegram, the SQLite store and the
//! extraction provider live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dates;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod intent;
pub mod logging;
pub mod messaging;
pub mod reports;
pub mod security;
pub mod store;

pub use errors::{Error, Result};
