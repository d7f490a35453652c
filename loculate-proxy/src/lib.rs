//! Travel-time proxy: hides the provider credential and normalizes the
//! provider's answer into `{duration, distance}`.

pub mod config;
pub mod server;

pub use config::ProxyConfig;
pub use server::{router, serve};
