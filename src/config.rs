use reqwest::Url;
use std::time::Duration;

/// Default connect timeout applied when none is configured explicitly.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Holds the endpoint addresses of one SPARQL repository.
///
/// The configuration is immutable after construction and is consumed by
/// exactly one [`RepositoryConnector`](crate::RepositoryConnector). Leaving
/// the update endpoint unset is the documented way to make a connector
/// read-only; leaving the data endpoint unset disables bulk Turtle loads.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    query_endpoint: Url,
    update_endpoint: Option<Url>,
    data_endpoint: Option<Url>,
    default_graph: Option<String>,
}

impl EndpointConfig {
    /// Creates a configuration with only a query endpoint. The resulting
    /// connector is read-only.
    pub fn new(query_endpoint: Url) -> Self {
        Self {
            query_endpoint,
            update_endpoint: None,
            data_endpoint: None,
            default_graph: None,
        }
    }

    /// Sets the SPARQL 1.1 Update endpoint, enabling write operations.
    #[must_use]
    pub fn with_update_endpoint(mut self, endpoint: Url) -> Self {
        self.update_endpoint = Some(endpoint);
        self
    }

    /// Sets the bulk graph-data endpoint, enabling Turtle-over-POST loads.
    #[must_use]
    pub fn with_data_endpoint(mut self, endpoint: Url) -> Self {
        self.data_endpoint = Some(endpoint);
        self
    }

    /// Sets the graph URI that read and write operations are scoped to.
    #[must_use]
    pub fn with_default_graph(mut self, graph: impl Into<String>) -> Self {
        self.default_graph = Some(graph.into());
        self
    }

    /// The SPARQL query endpoint.
    pub fn query_endpoint(&self) -> &Url {
        &self.query_endpoint
    }

    /// The SPARQL update endpoint, if writes are enabled.
    pub fn update_endpoint(&self) -> Option<&Url> {
        self.update_endpoint.as_ref()
    }

    /// The bulk data endpoint, if bulk loads are enabled.
    pub fn data_endpoint(&self) -> Option<&Url> {
        self.data_endpoint.as_ref()
    }

    /// The default graph URI, if one is configured.
    pub fn default_graph(&self) -> Option<&str> {
        self.default_graph.as_deref()
    }

    /// Whether the configuration permits no write operations at all.
    pub fn is_read_only(&self) -> bool {
        self.update_endpoint.is_none() && self.data_endpoint.is_none()
    }
}
