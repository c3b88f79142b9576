//! Command line and environment configuration.

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use zonglist_core::DriverInfo;
use zonglist_session::AutoAdvanceConfig;

/// Relay server for a shared in-car queue.
#[derive(Debug, Clone, Parser)]
#[command(name = "zonglist-relay", version, about)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "ZONGLIST_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Session hosted by this relay
    #[arg(long, env = "ZONGLIST_SESSION_ID", default_value = "tesla_driver_001")]
    pub session_id: String,

    #[arg(long, env = "ZONGLIST_DRIVER_NAME", default_value = "Driver")]
    pub driver_name: String,

    #[arg(long, env = "ZONGLIST_CAR_MODEL", default_value = "Tesla Model Y")]
    pub car_model: String,

    /// YouTube Data API key; search serves an empty catalogue without one
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Delay before promoting the next entry after a track ends (ms)
    #[arg(long, env = "ZONGLIST_AUTO_ADVANCE_MS", default_value_t = 1000)]
    pub auto_advance_ms: u64,
}

impl Args {
    #[must_use]
    pub fn driver_info(&self) -> DriverInfo {
        DriverInfo::new(self.driver_name.clone(), self.car_model.clone())
    }

    #[must_use]
    pub const fn auto_advance(&self) -> AutoAdvanceConfig {
        AutoAdvanceConfig {
            delay: Duration::from_millis(self.auto_advance_ms),
        }
    }

    /// The API key, if one was given and is not blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.youtube_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
