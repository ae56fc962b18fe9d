use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Seam between the source adapters and the network. One page fetch is one
/// `get_json` call; the per-object-id source issues one extra call per
/// candidate. Tests substitute fixture implementations.
pub trait Fetch {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("musedb/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("request to {url} returned status {status}");
        }

        response
            .json()
            .with_context(|| format!("invalid json body from {url}"))
    }
}
