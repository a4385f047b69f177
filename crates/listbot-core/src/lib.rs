//! Core domain + application logic for the collaborative list bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port (trait) implemented in the adapter crate.

pub mod audit;
pub mod config;
pub mod dialog;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod session;
pub mod store;

pub use errors::{Error, Result};
