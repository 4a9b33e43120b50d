//! Outbound messaging abstractions (Telegram today, anything else behind the same port).

pub mod port;
pub mod types;
