// vendbot/bot/src/lib.rs

//! vendbot: a Telegram storefront that sells single-use credentials.
//!
//! A buyer browses the catalog, pays a Xendit invoice, and the payment webhook
//! hands over one reserved stock item. The binary in `main.rs` wires the
//! pieces below into an actix-web server.

pub mod config;
pub mod errors;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod storefront;
pub mod web;

pub use crate::config::{AppConfig, StoreBackend};
pub use crate::errors::{AppError, Result};
pub use crate::state::AppState;
