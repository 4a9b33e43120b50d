//! Core domain + application logic for the Orthodox devotional Telegram bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind the
//! messaging port (trait) implemented in the adapter crate.

pub mod bible;
pub mod calendar;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod newsletter;
pub mod picker;
pub mod subscribers;
pub mod utils;

pub use errors::{Error, Result};
