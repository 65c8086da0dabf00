//! `billdesk-client` — typed client for the BillDesk REST API.
//!
//! Wire DTOs, the HTTP client with its session handling, and environment
//! configuration. Amounts shown to users are always computed locally with
//! the shared line-item calculator, never taken from the server.

pub mod client;
pub mod config;
pub mod dto;
pub mod error;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{error_message, ApiError};
