//! # Name Directory Resolution
//!
//! Resolves a claimed Wrap Name to the address that currently holds it, by
//! querying the external GraphQL indexer of the on-chain name registry. The
//! directory's answer is ground truth for the duration of one request —
//! nothing is cached, nothing is persisted, every verification resolves
//! fresh.
//!
//! Two outcomes are kept strictly apart:
//!
//! - `Ok(None)` — the directory answered and has no record for the name.
//!   The identity genuinely does not exist.
//! - `Err(DirectoryError)` — the directory could not be reached or its
//!   answer could not be decoded. Infrastructure trouble, not a missing
//!   name.
//!
//! Conflating the two would let an indexer outage read as "user does not
//! exist", which is both wrong and embarrassing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors talking to the directory. Always infrastructure, never "name not
/// found" — that is the `Ok(None)` case of [`Directory::resolve`].
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Transport(String),

    #[error("directory returned an undecodable response: {0}")]
    Decode(String),
}

/// The name → holder-address resolution seam.
///
/// The GraphQL indexer sits behind this trait so the login flow can be
/// tested without a network and so a different registry can be swapped in
/// without touching the core.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve `name` to its holder's address.
    ///
    /// Returns the address as reported by the directory — typically
    /// checksummed mixed-case hex. Callers normalize; this method does not.
    /// Zero matches is `Ok(None)`. If the directory returns several holders
    /// for one name, the first record wins; uniqueness is not validated.
    async fn resolve(&self, name: &str) -> Result<Option<String>, DirectoryError>;
}

/// A shared handle to a directory is itself a directory.
#[async_trait]
impl<T: Directory + ?Sized> Directory for std::sync::Arc<T> {
    async fn resolve(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        (**self).resolve(name).await
    }
}

// ---------------------------------------------------------------------------
// GraphQL wire types
// ---------------------------------------------------------------------------

/// Outbound GraphQL request envelope.
#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
    variables: NameVariables<'a>,
}

#[derive(Debug, Serialize)]
struct NameVariables<'a> {
    name: &'a str,
}

/// Inbound response: `{"data": {"agents": [{"holder": {"address": "0x…"}}]}}`.
#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: AgentsData,
}

#[derive(Debug, Deserialize)]
struct AgentsData {
    agents: Vec<AgentRecord>,
}

#[derive(Debug, Deserialize)]
struct AgentRecord {
    holder: HolderRecord,
}

#[derive(Debug, Deserialize)]
struct HolderRecord {
    address: String,
}

/// The exact-match lookup, parameterized with a GraphQL variable so the raw
/// name never gets spliced into query text.
const NAME_QUERY: &str = "query DotAgencyName($name: String!) {\n  agents(where: { name: $name }) {\n    holder {\n      address\n    }\n  }\n}";

// ---------------------------------------------------------------------------
// GraphDirectory
// ---------------------------------------------------------------------------

/// [`Directory`] backed by the GraphQL indexer over HTTP.
#[derive(Debug, Clone)]
pub struct GraphDirectory {
    client: reqwest::Client,
    endpoint: String,
}

impl GraphDirectory {
    /// Point at a GraphQL endpoint, e.g.
    /// [`crate::config::DEFAULT_DIRECTORY_ENDPOINT`].
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Directory for GraphDirectory {
    async fn resolve(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        let body = GraphqlRequest {
            query: NAME_QUERY,
            operation_name: "DotAgencyName",
            variables: NameVariables { name },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Transport(format!(
                "directory answered HTTP {status}"
            )));
        }

        let parsed: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        // First record wins when the directory reports multiple holders.
        Ok(parsed.data.agents.into_iter().next().map(|a| a.holder.address))
    }
}

// ---------------------------------------------------------------------------
// StaticDirectory
// ---------------------------------------------------------------------------

/// Fixed name → address map. Test double for the login flow.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    records: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name with its holder address.
    pub fn with_record(mut self, name: &str, address: &str) -> Self {
        self.records.insert(name.to_string(), address.to_string());
        self
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn resolve(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self.records.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. Response decoding picks the first holder ----------------------------

    #[test]
    fn response_decoding_takes_first_agent() {
        let raw = r#"{
            "data": {
                "agents": [
                    { "holder": { "address": "0xAbCdEf0123456789aBcDeF0123456789abcdef01" } },
                    { "holder": { "address": "0x0000000000000000000000000000000000000000" } }
                ]
            }
        }"#;
        let parsed: GraphqlResponse = serde_json::from_str(raw).unwrap();
        let first = parsed.data.agents.into_iter().next().unwrap();
        assert_eq!(
            first.holder.address,
            "0xAbCdEf0123456789aBcDeF0123456789abcdef01"
        );
    }

    // -- 2. Zero agents decodes cleanly to an empty list -------------------------

    #[test]
    fn empty_agent_list_decodes() {
        let raw = r#"{ "data": { "agents": [] } }"#;
        let parsed: GraphqlResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.data.agents.is_empty());
    }

    // -- 3. The request body carries the name as a variable ----------------------

    #[test]
    fn request_body_uses_variables() {
        let body = GraphqlRequest {
            query: NAME_QUERY,
            operation_name: "DotAgencyName",
            variables: NameVariables { name: "alice.wrap" },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "DotAgencyName");
        assert_eq!(json["variables"]["name"], "alice.wrap");
        // The raw name must not appear inside the query text itself.
        assert!(!json["query"].as_str().unwrap().contains("alice.wrap"));
    }

    // -- 4. Static directory resolves registered names only ----------------------

    #[tokio::test]
    async fn static_directory_resolves() {
        let dir = StaticDirectory::new()
            .with_record("alice.wrap", "0xAbCdEf0123456789aBcDeF0123456789abcdef01");
        assert_eq!(
            dir.resolve("alice.wrap").await.unwrap().as_deref(),
            Some("0xAbCdEf0123456789aBcDeF0123456789abcdef01")
        );
        assert_eq!(dir.resolve("bob.wrap").await.unwrap(), None);
    }
}
