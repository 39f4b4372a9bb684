//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

/// Where the server listens and where the GTFS feed lives.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the TCP listener binds.
    pub bind_addr: SocketAddr,

    /// Directory holding `stops.txt` and `stop_times_filtered.txt`.
    pub gtfs_dir: PathBuf,
}

impl ServerConfig {
    /// Build a configuration from the environment, falling back to the
    /// defaults for anything unset or unparseable.
    ///
    /// `TRANSIT_BIND_ADDR` overrides the bind address and
    /// `TRANSIT_GTFS_DIR` the feed directory.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TRANSIT_BIND_ADDR") {
            match addr.parse() {
                Ok(parsed) => config.bind_addr = parsed,
                Err(_) => warn!(addr = %addr, "ignoring unparseable TRANSIT_BIND_ADDR"),
            }
        }
        if let Ok(dir) = std::env::var("TRANSIT_GTFS_DIR") {
            config.gtfs_dir = PathBuf::from(dir);
        }

        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8200)),
            gtfs_dir: PathBuf::from("GTFS"),
        }
    }
}
