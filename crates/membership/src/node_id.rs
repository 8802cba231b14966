//! Node identity for cluster members

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::NodeIdError;

/// Address of a cluster endpoint, in `protocol://system@host:port` form.
///
/// Equality is an exact match on the original string, so two addresses that
/// differ only in letter case are different nodes.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an address reported by the engine without validating it.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Parse and validate an operator-supplied address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not a URL or lacks the system name,
    /// host, or port component.
    pub fn parse(address: &str) -> Result<Self, NodeIdError> {
        let trimmed = address.trim();

        let url = Url::parse(trimmed)
            .map_err(|e| NodeIdError::Malformed(trimmed.to_string(), e.to_string()))?;

        if url.username().is_empty() {
            return Err(NodeIdError::MissingSystem(trimmed.to_string()));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(NodeIdError::MissingHost(trimmed.to_string()));
        }

        if url.port().is_none() {
            return Err(NodeIdError::MissingPort(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The address as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
