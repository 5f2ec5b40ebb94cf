//! Session client: open a session through a `Transport`, send expressions,
//! and get replies back as `StaticValue`s.

pub mod config;
pub mod connection;
pub mod plugin;

pub use config::ClientConfig;
pub use connection::{connect, Connection};
pub use plugin::PluginTransport;
