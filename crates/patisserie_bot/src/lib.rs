//! Bot server for the Patisserie order engine.
//!
//! - [`Command`] parsing and [`Actor`] capability checks
//! - [`CommandRouter`]: runs commands against the services
//! - [`BotServer`]: sweeps plus the metrics API, until shutdown
//! - Discord adapters behind the `discord` feature

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod commands;
mod config;
#[cfg(feature = "discord")]
mod discord;
mod router;
mod server;
mod sink;

pub use api::{ApiState, create_router};
pub use commands::{Actor, Capability, Command, Origin};
pub use config::{
    ApiConfig, BotConfig, BrandingConfig, ChannelIds, DatabaseConfig, DiscordConfig,
    PremiumConfig, RoleIds, TimersConfig,
};
#[cfg(feature = "discord")]
pub use discord::{DiscordAdapter, DiscordHandler, build_client};
pub use router::{CommandRouter, Reply, strip_prefix};
pub use server::BotServer;
pub use sink::TracingSink;
