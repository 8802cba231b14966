//! Settings for the management service.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use cluster_mgmt_router::DEFAULT_ASK_TIMEOUT;

use crate::error::{Error, Result};

/// Default bind hostname.
pub const DEFAULT_HOSTNAME: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 19999;

/// Default path prefix for every route.
pub const DEFAULT_PATH_PREFIX: &str = "/cluster";

/// Where and how the management surface is served.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManagementSettings {
    /// Interface the HTTP server binds, see [`listen_addr`](Self::listen_addr).
    pub hostname: String,

    /// Port the HTTP server binds. 0 picks an ephemeral port.
    pub port: u16,

    /// Prefix every route is mounted under.
    pub path_prefix: String,

    /// How long a request waits on the command router.
    pub ask_timeout: Duration,
}

impl Default for ManagementSettings {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            ask_timeout: DEFAULT_ASK_TIMEOUT,
        }
    }
}

impl ManagementSettings {
    /// Socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an error if `hostname` is neither an IP address nor `localhost`.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip = if self.hostname.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.hostname
                .parse()
                .map_err(|_| Error::InvalidHostname(self.hostname.clone()))?
        };

        Ok(SocketAddr::new(ip, self.port))
    }

    /// The path prefix with a single leading slash and no trailing slash.
    ///
    /// Empty when routes are mounted at the root.
    #[must_use]
    pub fn normalized_prefix(&self) -> String {
        normalize_prefix(&self.path_prefix)
    }
}

pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
