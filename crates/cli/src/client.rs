//! HTTP client for the management surface.

use cluster_mgmt_gateway::api::{MessageResponse, UnreachableResponse};
use cluster_mgmt_membership::{
    ClusterMember, MembershipSnapshot, ShardRegionStats, UnreachableObservation,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Talks to one management endpoint.
#[derive(Clone, Debug)]
pub struct ManagementClient {
    http: reqwest::Client,
    base: Url,
}

impl ManagementClient {
    /// Create a client for `http://{hostname}:{port}{path_prefix}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parts do not form a valid URL.
    pub fn new(hostname: &str, port: u16, path_prefix: &str) -> Result<Self> {
        let host = if hostname.contains(':') && !hostname.starts_with('[') {
            format!("[{hostname}]")
        } else {
            hostname.to_string()
        };

        let prefix = path_prefix.trim().trim_matches('/');
        let base = if prefix.is_empty() {
            format!("http://{host}:{port}/")
        } else {
            format!("http://{host}:{port}/{prefix}/")
        };

        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(&base)?,
        })
    }

    /// Base URL every route is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Ask the node to join the cluster at `address`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn join(&self, address: &str) -> Result<String> {
        let request = self
            .http
            .post(self.endpoint("members")?)
            .form(&[("address", address)]);

        Ok(self.send::<MessageResponse>(request).await?.message)
    }

    /// Ask `address` to leave the cluster.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn leave(&self, address: &str) -> Result<String> {
        let request = self
            .http
            .delete(self.endpoint("members")?)
            .form(&[("address", address)]);

        Ok(self.send::<MessageResponse>(request).await?.message)
    }

    /// Mark `address` as down.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn down(&self, address: &str) -> Result<String> {
        let request = self
            .http
            .put(self.endpoint("members")?)
            .form(&[("address", address), ("operation", "down")]);

        Ok(self.send::<MessageResponse>(request).await?.message)
    }

    /// The full membership view.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn members(&self) -> Result<MembershipSnapshot> {
        self.send(self.http.get(self.endpoint("members")?)).await
    }

    /// A single member.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn member(&self, address: &str) -> Result<ClusterMember> {
        let request = self
            .http
            .get(self.endpoint("members")?)
            .query(&[("address", address)]);

        self.send(request).await
    }

    /// Unreachable observations, curated by the server when `curate` is set.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn unreachable(&self, curate: bool) -> Result<Vec<UnreachableObservation>> {
        let request = self
            .http
            .get(self.endpoint("unreachable")?)
            .query(&[("curate", curate)]);

        Ok(self.send::<UnreachableResponse>(request).await?.unreachable)
    }

    /// Per-shard statistics of a shard region.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn shards(&self, region: &str) -> Result<ShardRegionStats> {
        let mut url = self.endpoint("shards")?;
        let cannot_be_a_base = Error::CannotBeABase(url.to_string());
        url.path_segments_mut()
            .map_err(|()| cannot_be_a_base)?
            .push(region);

        self.send(self.http.get(url)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn api_error(response: Response) -> Error {
    let status = response.status();
    let message = match response.json::<MessageResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let client = ManagementClient::new("127.0.0.1", 19999, "/cluster").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:19999/cluster/");
        assert_eq!(
            client.endpoint("members").unwrap().as_str(),
            "http://127.0.0.1:19999/cluster/members"
        );

        let client = ManagementClient::new("localhost", 80, "/").unwrap();
        assert_eq!(client.endpoint("members").unwrap().as_str(), "http://localhost/members");

        let client = ManagementClient::new("::1", 19999, "ops/cluster/").unwrap();
        assert_eq!(client.base_url().as_str(), "http://[::1]:19999/ops/cluster/");
    }

    #[test]
    fn test_invalid_host() {
        assert!(matches!(
            ManagementClient::new("bad host", 19999, "/cluster"),
            Err(Error::InvalidUrl(_))
        ));
    }
}
