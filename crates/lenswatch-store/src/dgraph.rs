//! Dgraph HTTP store implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use lenswatch_core::{LensSummary, ScopedGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::query::{LENS_SCOPE_QUERY, lens_listing};
use crate::store::{FetchError, GraphStore, StoreConnector};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens read-only sessions against a Dgraph alpha's HTTP endpoint.
///
/// The underlying `reqwest::Client` pools connections; each session is a
/// cheap handle that is released when dropped.
pub struct DgraphConnector {
    client: reqwest::Client,
    endpoint: String,
}

impl DgraphConnector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StoreConnector for DgraphConnector {
    async fn connect(&self) -> Result<Box<dyn GraphStore>, FetchError> {
        debug!("Opening Dgraph session to {}", self.endpoint);
        Ok(Box::new(DgraphSession {
            client: self.client.clone(),
            query_url: format!("{}/query", self.endpoint),
        }))
    }

    fn name(&self) -> &str {
        "dgraph"
    }
}

/// A single request's view of the store.
pub struct DgraphSession {
    client: reqwest::Client,
    query_url: String,
}

#[derive(Debug, Serialize)]
struct DgraphRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    variables: HashMap<&'a str, String>,
}

#[derive(Debug, Deserialize)]
struct DgraphResponse {
    #[serde(default)]
    data: Option<HashMap<String, Value>>,
    #[serde(default)]
    errors: Vec<DgraphError>,
}

#[derive(Debug, Deserialize)]
struct DgraphError {
    message: String,
}

impl DgraphSession {
    /// Run one read-only query and return the `q0` block.
    async fn query(&self, query: &str, variables: HashMap<&str, String>) -> Result<Value, FetchError> {
        let request = DgraphRequest { query, variables };

        let response = self
            .client
            .post(&self.query_url)
            .query(&[("ro", "true"), ("be", "true")])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: DgraphResponse = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::Query(messages.join("; ")));
        }

        body.data
            .and_then(|mut data| data.remove("q0"))
            .ok_or_else(|| FetchError::Decode("response has no `q0` block".to_string()))
    }
}

#[async_trait]
impl GraphStore for DgraphSession {
    async fn fetch_scope(&self, lens: &str) -> Result<ScopedGraph, FetchError> {
        let variables = HashMap::from([("$a", lens.to_string())]);
        let q0 = self.query(LENS_SCOPE_QUERY, variables).await?;
        let graph = ScopedGraph::from_json(q0)?;
        debug!("Fetched {} root(s) for lens {}", graph.roots.len(), lens);
        Ok(graph)
    }

    async fn list_lenses(&self, prefix: &str) -> Result<Vec<LensSummary>, FetchError> {
        let (query, variable) = lens_listing(prefix);
        let variables = variable.into_iter().collect();
        let q0 = self.query(query, variables).await?;
        serde_json::from_value(q0).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn name(&self) -> &str {
        "dgraph"
    }
}

impl Drop for DgraphSession {
    fn drop(&mut self) {
        debug!("Released Dgraph session");
    }
}
