//! Server configuration.

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

use crate::config::StrategyScope;

/// HTTP server configuration for the key/value service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Store holding the service's values: `session` (in-memory) or `local` (file).
    #[serde(default = "default_backing")]
    pub backing: StrategyScope,
}

const fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    4000
}

const fn default_backing() -> StrategyScope {
    StrategyScope::Session
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backing: default_backing(),
        }
    }
}
