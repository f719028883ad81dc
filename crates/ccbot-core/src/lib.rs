//! Core domain + application logic for the Creative Commons audio bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP
//! scraper live behind ports (traits) implemented in adapter crates.

pub mod archive;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod polling;
pub mod ports;
pub mod utils;

pub use errors::{Error, Result};
