//! Engine configuration
//!
//! Resolves listen port, database path, and bus address through the
//! shared priority order (CLI > environment > config file > default).

use feedloop_common::config::resolve_setting;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5750;
pub const DEFAULT_DATABASE: &str = "feedloop.db";
pub const DEFAULT_BUS_ADDR: &str = "127.0.0.1:7400";

/// Resolved engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// HTTP/WebSocket listen port
    pub port: u16,

    /// Path to the sqlite database holding stream definitions
    pub database_path: PathBuf,

    /// Message bus address (host:port)
    pub bus_addr: String,
}

impl EngineConfig {
    /// Resolve configuration from optional CLI overrides
    pub fn resolve(
        port: Option<u16>,
        database: Option<&str>,
        bus_addr: Option<&str>,
    ) -> crate::Result<Self> {
        let port_arg = port.map(|p| p.to_string());
        let port = match resolve_setting(port_arg.as_deref(), "FEEDLOOP_PORT", "port") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| crate::Error::Config(format!("Invalid port: {}", value)))?,
            None => DEFAULT_PORT,
        };

        let database_path = resolve_setting(database, "FEEDLOOP_DB", "database")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let bus_addr = resolve_setting(bus_addr, "FEEDLOOP_BUS_ADDR", "bus_addr")
            .unwrap_or_else(|| DEFAULT_BUS_ADDR.to_string());

        Ok(Self {
            port,
            database_path,
            bus_addr,
        })
    }
}
