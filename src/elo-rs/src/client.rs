use crate::error::{classify, ClientError, Result};
use elo_core::{
    ClientConfig, Data, EdgeListResult, EdgeQuery, NearbyQuery, NodeQuery, NodeView,
    PathResponse, Recommendation, RecommendationQuery, SchemaDefinition,
};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

const NO_BODY: Option<&()> = None;

/// Elo REST API Client
///
/// Every call is one blocking round trip bounded by the configured timeout.
/// The connection pool is released when the client is dropped or closed.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    api_key: Option<String>,
    http: HttpClient,
}

#[derive(Serialize)]
struct CreateNodeRequest<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Data>,
}

#[derive(Serialize)]
struct CreateEdgeRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Data>,
}

#[derive(Serialize)]
struct KeyValueRequest<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct EdgeKeyValueRequest<'a> {
    from: &'a str,
    to: &'a str,
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct PatchNodeRequest<'a> {
    data: &'a Data,
}

#[derive(Serialize)]
struct PatchEdgeRequest<'a> {
    from: &'a str,
    to: &'a str,
    data: &'a Data,
}

#[derive(Serialize)]
struct SchemaRequest<'a> {
    entity: &'a str,
    fields: &'a [String],
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ClientError::usage(format!("{field} is required")));
    }
    Ok(())
}

fn non_empty(data: &Data) -> Option<&Data> {
    (!data.is_empty()).then_some(data)
}

/// Local HTTP client setup failure; nothing was sent to the server
fn init_error(err: reqwest::Error) -> ClientError {
    ClientError::usage(format!("failed to initialize HTTP client: {err}"))
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text()?;
    Ok(serde_json::from_str(&body)?)
}

impl Client {
    /// Create a client for `base_url` with default settings
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::connect(&ClientConfig::new(base_url))
    }

    /// Create a client from explicit configuration
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url()).map_err(|e| {
            ClientError::usage(format!("invalid base url {:?}: {e}", config.base_url()))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::usage(format!(
                "base url {base_url} cannot carry a path"
            )));
        }

        let timeout = config.timeout().ok_or_else(|| {
            ClientError::usage(format!(
                "timeout must be a finite, non-negative number of seconds, got {}",
                config.timeout_secs
            ))
        })?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(init_error)?;
        tracing::debug!(base_url = %base_url, ?timeout, "Elo client ready");

        Ok(Self {
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Release the underlying connection pool
    pub fn close(self) {
        tracing::debug!(base_url = %self.base_url, "Elo client closed");
    }

    /// Send a raw request.
    ///
    /// `path` is split on `/` and each segment is percent-encoded, so it must
    /// not carry a query string: `?` and `&` end up escaped in the path. Pass
    /// query parameters through `query` instead. Returns the response for 2xx
    /// statuses; anything else is classified into an error.
    pub fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let url = self.endpoint(&segments)?;
        self.send(method, url, body, query)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::usage("base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        query: &[(&str, String)],
    ) -> Result<Response> {
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.text() {
            Ok(text) if !text.is_empty() => text,
            _ => status.canonical_reason().unwrap_or_default().to_string(),
        };
        tracing::warn!(%method, %url, status = status.as_u16(), "Request failed: {}", message);
        Err(classify(status.as_u16(), message))
    }

    /// Create a node; empty data is omitted from the body
    #[tracing::instrument(skip(self, data))]
    pub fn create_node(&self, id: &str, data: &Data) -> Result<()> {
        require("node id", id)?;
        let req = CreateNodeRequest {
            id,
            data: non_empty(data),
        };
        self.send(Method::POST, self.endpoint(&["nodes"])?, Some(&req), &[])?;
        Ok(())
    }

    /// Create a directed edge
    #[tracing::instrument(skip(self, data))]
    pub fn create_edge(&self, from_id: &str, to_id: &str, data: &Data) -> Result<()> {
        require("from id", from_id)?;
        require("to id", to_id)?;
        let req = CreateEdgeRequest {
            from: from_id,
            to: to_id,
            data: non_empty(data),
        };
        self.send(Method::POST, self.endpoint(&["edges"])?, Some(&req), &[])?;
        Ok(())
    }

    /// Set a single data field on a node
    #[tracing::instrument(skip(self, value))]
    pub fn set_node_data(&self, id: &str, key: &str, value: &str) -> Result<()> {
        require("node id", id)?;
        let req = KeyValueRequest { key, value };
        self.send(Method::PUT, self.endpoint(&["nodes", id, "data"])?, Some(&req), &[])?;
        Ok(())
    }

    /// Set a single data field on an edge
    #[tracing::instrument(skip(self, value))]
    pub fn set_edge_data(&self, from_id: &str, to_id: &str, key: &str, value: &str) -> Result<()> {
        require("from id", from_id)?;
        require("to id", to_id)?;
        let req = EdgeKeyValueRequest {
            from: from_id,
            to: to_id,
            key,
            value,
        };
        self.send(Method::PUT, self.endpoint(&["edges"])?, Some(&req), &[])?;
        Ok(())
    }

    /// Merge `data` into a node's fields. Empty data is rejected.
    #[tracing::instrument(skip(self, data))]
    pub fn update_node(&self, id: &str, data: &Data) -> Result<()> {
        require("node id", id)?;
        if data.is_empty() {
            return Err(ClientError::usage("update_node requires at least one field"));
        }
        let req = PatchNodeRequest { data };
        self.send(Method::PATCH, self.endpoint(&["nodes", id])?, Some(&req), &[])?;
        Ok(())
    }

    /// Merge `data` into an edge's fields. Empty data is rejected.
    #[tracing::instrument(skip(self, data))]
    pub fn update_edge(&self, from_id: &str, to_id: &str, data: &Data) -> Result<()> {
        require("from id", from_id)?;
        require("to id", to_id)?;
        if data.is_empty() {
            return Err(ClientError::usage("update_edge requires at least one field"));
        }
        let req = PatchEdgeRequest {
            from: from_id,
            to: to_id,
            data,
        };
        self.send(Method::PATCH, self.endpoint(&["edges"])?, Some(&req), &[])?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_node(&self, id: &str) -> Result<()> {
        require("node id", id)?;
        self.send(Method::DELETE, self.endpoint(&["nodes", id])?, NO_BODY, &[])?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn delete_edge(&self, from_id: &str, to_id: &str) -> Result<()> {
        require("from id", from_id)?;
        require("to id", to_id)?;
        let query = [("from", from_id.to_string()), ("to", to_id.to_string())];
        self.send(Method::DELETE, self.endpoint(&["edges"])?, NO_BODY, &query)?;
        Ok(())
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str, hydrate: Option<bool>) -> Result<NodeView> {
        require("node id", id)?;
        let query: Vec<_> = hydrate.map(|h| ("hydrate", h.to_string())).into_iter().collect();
        let response = self.send(Method::GET, self.endpoint(&["nodes", id])?, NO_BODY, &query)?;
        read_json(response)
    }

    pub fn list_nodes(&self, query: &NodeQuery) -> Result<Vec<NodeView>> {
        let response = self.send(
            Method::GET,
            self.endpoint(&["nodes"])?,
            NO_BODY,
            &query.to_params(),
        )?;
        read_json(response)
    }

    pub fn list_edges(&self, query: &EdgeQuery) -> Result<Vec<EdgeListResult>> {
        let response = self.send(
            Method::GET,
            self.endpoint(&["edges"])?,
            NO_BODY,
            &query.to_params(),
        )?;
        read_json(response)
    }

    /// Whether the server knows a directed path from `from_id` to `to_id`
    pub fn path_exists(&self, from_id: &str, to_id: &str) -> Result<bool> {
        require("from id", from_id)?;
        require("to id", to_id)?;
        let query = [("from", from_id.to_string()), ("to", to_id.to_string())];
        let response = self.send(Method::GET, self.endpoint(&["path"])?, NO_BODY, &query)?;
        let path: PathResponse = read_json(response)?;
        Ok(path.exists)
    }

    /// Nodes of one type whose geohash field starts with the query prefix
    pub fn nearby(&self, query: &NearbyQuery) -> Result<Vec<NodeView>> {
        require("node type", &query.node_type)?;
        require("geohash prefix", &query.geo_hash_prefix)?;
        let response = self.send(
            Method::GET,
            self.endpoint(&["nearby"])?,
            NO_BODY,
            &query.to_params(),
        )?;
        read_json(response)
    }

    pub fn recommendations(&self, query: &RecommendationQuery) -> Result<Vec<Recommendation>> {
        require("start node", &query.start)?;
        require("node type", &query.node_type)?;
        let response = self.send(
            Method::GET,
            self.endpoint(&["recommendations"])?,
            NO_BODY,
            &query.to_params(),
        )?;
        read_json(response)
    }

    /// Declare the field list of an entity kind
    #[tracing::instrument(skip(self))]
    pub fn upsert_schema(&self, entity: &str, fields: &[String]) -> Result<()> {
        require("schema entity", entity)?;
        let req = SchemaRequest { entity, fields };
        self.send(Method::POST, self.endpoint(&["schema"])?, Some(&req), &[])?;
        Ok(())
    }

    /// Declared schemas, optionally for a single entity kind
    pub fn get_schema(&self, entity: Option<&str>) -> Result<Vec<SchemaDefinition>> {
        let query: Vec<_> = entity.map(|e| ("entity", e.to_string())).into_iter().collect();
        let response = self.send(Method::GET, self.endpoint(&["schema"])?, NO_BODY, &query)?;
        read_json(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = Client::new("http://127.0.0.1:3000/").unwrap();
        let url = client.endpoint(&["nodes", "user:123", "data"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/nodes/user:123/data");

        let url = client.endpoint(&["nodes", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/nodes/a%20b%2Fc");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = Client::new("http://localhost:8080/api").unwrap();
        let url = client.endpoint(&["edges"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/edges");
    }

    #[test]
    fn test_connect_rejects_bad_config() {
        assert!(matches!(Client::new("not a url"), Err(ClientError::Usage(_))));
        assert!(matches!(Client::new("mailto:team@example.com"), Err(ClientError::Usage(_))));

        let mut config = ClientConfig::default();
        config.timeout_secs = -1.0;
        assert!(matches!(Client::connect(&config), Err(ClientError::Usage(_))));
    }

    #[test]
    fn test_empty_api_key_is_not_sent() {
        let config = ClientConfig::new("http://127.0.0.1:3000").with_api_key("");
        let client = Client::connect(&config).unwrap();
        assert!(client.api_key.is_none());

        let config = ClientConfig::new("http://127.0.0.1:3000").with_api_key("seu_token");
        let client = Client::connect(&config).unwrap();
        assert_eq!(client.api_key.as_deref(), Some("seu_token"));
    }

    #[test]
    fn test_init_failure_is_not_a_connection_error() {
        // An unparsable URL fails while building the request, before any I/O
        let err = HttpClient::new().get("http://[::1").build().unwrap_err();
        let err = init_error(err);
        assert!(matches!(err, ClientError::Usage(m) if m.starts_with("failed to initialize")));
    }

    #[test]
    fn test_raw_path_does_not_carry_a_query() {
        let client = Client::new("http://127.0.0.1:3000").unwrap();
        let url = client.endpoint(&["nodes?type=Team"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:3000/nodes%3Ftype=Team");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_usage_errors_skip_the_network() {
        // Nothing listens here; a usage error proves no request was attempted
        let client = Client::new("http://127.0.0.1:1").unwrap();
        let empty = Data::new();

        assert!(matches!(client.create_node("", &empty), Err(ClientError::Usage(_))));
        assert!(matches!(client.update_node("user:1", &empty), Err(ClientError::Usage(_))));
        assert!(matches!(client.update_edge("a", "b", &empty), Err(ClientError::Usage(_))));
        assert!(matches!(client.delete_edge("a", ""), Err(ClientError::Usage(_))));
        assert!(matches!(
            client.nearby(&NearbyQuery::new("", "6g")),
            Err(ClientError::Usage(_))
        ));
    }
}
