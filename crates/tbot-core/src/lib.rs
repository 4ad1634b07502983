//! Core of the tbot Telegram Bot API client.
//!
//! This crate is transport-agnostic: the HTTP exchange lives behind
//! [`transport::ApiBackend`], implemented in the `tbot-http` adapter crate.
//! Everything else (polling, decoding, the update mailbox, commands) is here.

pub mod bot;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod decode;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod logging;
pub mod poller;
pub mod store;
pub mod transport;

pub use bot::Bot;
pub use commands::EditOutcome;
pub use config::Config;
pub use errors::{Error, Result};
pub use poller::PollerState;
pub use store::ConsumeFilter;
