//! Discord REST API access.
//!
//! - `config`: endpoint, token, and default guild loaded from the environment
//! - `discord`: the request layer and its error type
//! - `models`: wire types for the endpoints the tools use
//!
//! [`DiscordClient`] also implements [`log_scan::LogSource`], which is the only
//! way the scanning tools reach Discord.

pub mod config;
pub mod discord;
pub mod models;

pub use config::{ConfigError, DiscordConfig, ServiceEndpoint};
pub use discord::{DiscordClient, DiscordError};
