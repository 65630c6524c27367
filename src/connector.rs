use crate::config::{EndpointConfig, DEFAULT_CONNECT_TIMEOUT};
use crate::error::{classify_status, classify_transport, FailureOutcome, RepositoryError};
use crate::namespaces::NamespaceRegistry;
use crate::results::{parse_results_xml, ResultTable};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

const RESULTS_ACCEPT: &str = "application/sparql-results+xml,application/xml;q=0.8";
const TURTLE_CONTENT_TYPE: &str = "application/x-turtle";

/// Which of the repository's endpoints a [`RepositoryConnector::ping`]
/// probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTarget {
    Query,
    Update,
    Data,
}

/// Modifiers for a `SELECT` query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    distinct: bool,
    order_by: Option<String>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests `SELECT DISTINCT` (or `COUNT(DISTINCT …)` for count
    /// queries).
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Sets the raw `ORDER BY` clause body. Ignored by count queries, which
    /// are not orderable.
    #[must_use]
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A synchronous client for one SPARQL repository.
///
/// The connector owns a single HTTP client handle for its whole lifetime and
/// reconfigures it per call, so the underlying TCP connection stays warm
/// across requests. Every operation takes `&mut self`: one connector serves
/// one call at a time, and callers that need overlapping requests create one
/// connector per in-flight request.
///
/// Queries and updates are built from caller-supplied clause text; the
/// connector never parses or validates SPARQL itself.
#[derive(Debug)]
pub struct RepositoryConnector {
    config: EndpointConfig,
    namespaces: NamespaceRegistry,
    client: Client,
}

impl RepositoryConnector {
    /// Creates a connector with the default connect timeout of ten seconds.
    pub fn new(
        config: EndpointConfig,
        namespaces: NamespaceRegistry,
    ) -> Result<Self, RepositoryError> {
        Self::with_connect_timeout(config, namespaces, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Creates a connector with an explicit connect timeout. This is the
    /// only timeout knob; there is no separate read timeout and no retry.
    pub fn with_connect_timeout(
        config: EndpointConfig,
        namespaces: NamespaceRegistry,
        connect_timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            config,
            namespaces,
            client,
        })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    /// Probes one endpoint with a deliberately degenerate request.
    ///
    /// Returns true when the store answered at all with a success status or
    /// with 400/500 — the latter two mean the store is alive and rejecting
    /// the probe. Returns false for an unconfigured endpoint, a transport
    /// failure, or a 404 (the endpoint is gone).
    pub fn ping(&mut self, target: ServiceTarget) -> bool {
        let request = match target {
            ServiceTarget::Query => {
                Some(self.client.head(self.config.query_endpoint().clone()))
            }
            ServiceTarget::Update => self
                .config
                .update_endpoint()
                .map(|endpoint| self.client.head(endpoint.clone())),
            ServiceTarget::Data => self.config.data_endpoint().map(|endpoint| {
                self.client
                    .post(self.data_url(endpoint))
                    .header(CONTENT_TYPE, TURTLE_CONTENT_TYPE)
                    .body(String::new())
            }),
        };
        let Some(request) = request else {
            return false;
        };
        match request.send() {
            Ok(response) => {
                let status = response.status();
                status.is_success()
                    || status.is_redirection()
                    || matches!(status.as_u16(), 400 | 500)
            }
            Err(_) => false,
        }
    }

    /// Builds and executes a `SELECT` query over the given where clause.
    pub fn select(
        &mut self,
        vars: &[&str],
        where_clause: &str,
        options: &QueryOptions,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<ResultTable, RepositoryError> {
        let sparql = self.sparql_for_select(vars, where_clause, options, extra_namespaces);
        self.do_query(&sparql)
    }

    /// Builds and executes an `ASK` query. The answer lands in a
    /// single-cell table, see [`ResultTable::is_boolean_true`].
    pub fn ask(
        &mut self,
        where_clause: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<ResultTable, RepositoryError> {
        let sparql = format!(
            "{}ASK {{\n{where_clause}\n}}",
            self.namespaces.sparql_declarations(extra_namespaces)
        );
        self.do_query(&sparql)
    }

    /// Builds and executes a `SELECT (COUNT(…) AS ?count)` query. Only the
    /// offset and limit options apply, see [`ResultTable::numeric_value`].
    pub fn select_count(
        &mut self,
        variable: &str,
        where_clause: &str,
        options: &QueryOptions,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<ResultTable, RepositoryError> {
        let sparql =
            self.sparql_for_select_count(variable, where_clause, options, extra_namespaces);
        self.do_query(&sparql)
    }

    /// Executes `DELETE { … } WHERE { … }`, scoped to the default graph when
    /// one is configured.
    pub fn delete(
        &mut self,
        delete_pattern: &str,
        where_clause: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<bool, RepositoryError> {
        let sparql = format!(
            "{}{}DELETE {{\n{delete_pattern}\n}}\nWHERE {{\n{where_clause}\n}}",
            self.namespaces.sparql_declarations(extra_namespaces),
            self.with_clause()
        );
        self.do_update(&sparql)
    }

    /// Deletes every triple in the default graph.
    pub fn delete_all(&mut self) -> Result<bool, RepositoryError> {
        self.delete("?s ?p ?o", "?s ?p ?o", &[])
    }

    /// Deletes all triples of every subject that carries the given
    /// property-value pair. Used to cascade-delete the triples derived from
    /// one entity.
    pub fn delete_content_by_value(
        &mut self,
        property_term: &str,
        object_term: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<bool, RepositoryError> {
        let where_clause = format!("?s {property_term} {object_term} . ?s ?p ?o");
        self.delete("?s ?p ?o", &where_clause, extra_namespaces)
    }

    /// Executes `DELETE { … } INSERT { … } WHERE { … }` as one update,
    /// scoped to the default graph when one is configured.
    pub fn insert_delete(
        &mut self,
        insert_pattern: &str,
        delete_pattern: &str,
        where_clause: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<bool, RepositoryError> {
        let sparql = format!(
            "{}{}DELETE {{\n{delete_pattern}\n}}\nINSERT {{\n{insert_pattern}\n}}\nWHERE {{\n{where_clause}\n}}",
            self.namespaces.sparql_declarations(extra_namespaces),
            self.with_clause()
        );
        self.do_update(&sparql)
    }

    /// Inserts ground triples. Prefers the bulk data endpoint (one Turtle
    /// POST) when configured, and falls back to an `INSERT DATA` update
    /// otherwise.
    pub fn insert_data(
        &mut self,
        triples: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<bool, RepositoryError> {
        if self.config.data_endpoint().is_some() {
            let payload = format!(
                "{}{triples}",
                self.namespaces.turtle_declarations(extra_namespaces)
            );
            self.do_http_post(&payload)
        } else {
            let sparql = self.sparql_for_data_update("INSERT", triples, extra_namespaces);
            self.do_update(&sparql)
        }
    }

    /// Removes ground triples with a `DELETE DATA` update.
    pub fn delete_data(
        &mut self,
        triples: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> Result<bool, RepositoryError> {
        let sparql = self.sparql_for_data_update("DELETE", triples, extra_namespaces);
        self.do_update(&sparql)
    }

    /// Executes an already-built query text against the query endpoint.
    ///
    /// An unreachable or missing store degrades to an empty table flagged
    /// [`ErrorCode::Unreachable`](crate::ErrorCode::Unreachable); a store
    /// that rejects the query raises.
    pub fn do_query(&mut self, sparql: &str) -> Result<ResultTable, RepositoryError> {
        let endpoint = self.config.query_endpoint().clone();
        debug!(endpoint = %endpoint, "posting SPARQL query");
        let response = self
            .client
            .post(endpoint.clone())
            .header(ACCEPT, RESULTS_ACCEPT)
            .form(&[("query", sparql)])
            .send();
        match response {
            Ok(response) if response.status().is_success() => match response.text() {
                Ok(body) => Ok(parse_results_xml(&body)),
                Err(error) => Self::degraded_read(classify_transport(&error, endpoint.as_str())),
            },
            Ok(response) => Self::degraded_read(classify_status(
                response.status(),
                sparql,
                endpoint.as_str(),
            )),
            Err(error) => Self::degraded_read(classify_transport(&error, endpoint.as_str())),
        }
    }

    /// Executes an already-built update text against the update endpoint.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the store is
    /// unreachable; raises [`RepositoryError::NoService`] before any network
    /// I/O when no update endpoint is configured.
    pub fn do_update(&mut self, sparql: &str) -> Result<bool, RepositoryError> {
        let Some(endpoint) = self.config.update_endpoint() else {
            return Err(RepositoryError::NoService { service: "update" });
        };
        let endpoint = endpoint.clone();
        debug!(endpoint = %endpoint, "posting SPARQL update");
        let response = self
            .client
            .post(endpoint.clone())
            .form(&[("update", sparql)])
            .send();
        Self::write_result(response, sparql, endpoint.as_str())
    }

    /// Posts a raw Turtle payload to the bulk data endpoint, targeting the
    /// default graph (`?graph=<uri>`) or the store's default (`?default`).
    ///
    /// Same outcome contract as [`Self::do_update`].
    pub fn do_http_post(&mut self, payload: &str) -> Result<bool, RepositoryError> {
        let Some(endpoint) = self.config.data_endpoint() else {
            return Err(RepositoryError::NoService { service: "data" });
        };
        let url = self.data_url(endpoint);
        debug!(endpoint = %url, bytes = payload.len(), "posting Turtle payload");
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, TURTLE_CONTENT_TYPE)
            .body(payload.to_owned())
            .send();
        Self::write_result(response, payload, url.as_str())
    }

    fn data_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        match self.config.default_graph() {
            Some(graph) => {
                url.query_pairs_mut().append_pair("graph", graph);
            }
            None => url.set_query(Some("default")),
        }
        url
    }

    fn with_clause(&self) -> String {
        match self.config.default_graph() {
            Some(graph) => format!("WITH <{graph}>\n"),
            None => String::new(),
        }
    }

    fn sparql_for_select(
        &self,
        vars: &[&str],
        where_clause: &str,
        options: &QueryOptions,
        extra_namespaces: &[(&str, &str)],
    ) -> String {
        let mut sparql = self.namespaces.sparql_declarations(extra_namespaces);
        sparql.push_str("SELECT ");
        if options.distinct {
            sparql.push_str("DISTINCT ");
        }
        sparql.push_str(&vars.join(" "));
        sparql.push_str(&format!(" WHERE {{\n{where_clause}\n}}"));
        if let Some(order_by) = &options.order_by {
            sparql.push_str(&format!("\nORDER BY {order_by}"));
        }
        Self::push_window(&mut sparql, options);
        sparql
    }

    fn sparql_for_select_count(
        &self,
        variable: &str,
        where_clause: &str,
        options: &QueryOptions,
        extra_namespaces: &[(&str, &str)],
    ) -> String {
        let mut sparql = self.namespaces.sparql_declarations(extra_namespaces);
        let distinct = if options.distinct { "DISTINCT " } else { "" };
        sparql.push_str(&format!(
            "SELECT (COUNT({distinct}{variable}) AS ?count) WHERE {{\n{where_clause}\n}}"
        ));
        Self::push_window(&mut sparql, options);
        sparql
    }

    fn sparql_for_data_update(
        &self,
        keyword: &str,
        triples: &str,
        extra_namespaces: &[(&str, &str)],
    ) -> String {
        let prefixes = self.namespaces.sparql_declarations(extra_namespaces);
        match self.config.default_graph() {
            Some(graph) => format!(
                "{prefixes}{keyword} DATA {{\nGRAPH <{graph}> {{\n{triples}\n}}\n}}"
            ),
            None => format!("{prefixes}{keyword} DATA {{\n{triples}\n}}"),
        }
    }

    fn push_window(sparql: &mut String, options: &QueryOptions) {
        if let Some(offset) = options.offset {
            sparql.push_str(&format!("\nOFFSET {offset}"));
        }
        if let Some(limit) = options.limit {
            sparql.push_str(&format!("\nLIMIT {limit}"));
        }
    }

    fn degraded_read(outcome: FailureOutcome) -> Result<ResultTable, RepositoryError> {
        match outcome {
            FailureOutcome::Degrade => Ok(ResultTable::unreachable()),
            FailureOutcome::Fail(error) => Err(error),
        }
    }

    fn write_result(
        response: reqwest::Result<Response>,
        text: &str,
        endpoint: &str,
    ) -> Result<bool, RepositoryError> {
        match response {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => match classify_status(response.status(), text, endpoint) {
                FailureOutcome::Degrade => Ok(false),
                FailureOutcome::Fail(error) => Err(error),
            },
            Err(error) => match classify_transport(&error, endpoint) {
                FailureOutcome::Degrade => Ok(false),
                FailureOutcome::Fail(error) => Err(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NamespaceRegistry {
        NamespaceRegistry::new(
            "http://example.org/id/",
            "http://example.org/swivt/1.0#",
            "http://example.org/id/Property:",
        )
    }

    fn connector(default_graph: Option<&str>) -> RepositoryConnector {
        let mut config = EndpointConfig::new(
            Url::parse("http://localhost:8890/sparql").unwrap(),
        );
        if let Some(graph) = default_graph {
            config = config.with_default_graph(graph);
        }
        RepositoryConnector::new(config, registry()).unwrap()
    }

    #[test]
    fn select_text_is_deterministic() {
        let connector = connector(None);
        let options = QueryOptions::new().distinct().offset(5).limit(10);
        let sparql = connector.sparql_for_select(&["?x"], "?x a ?y", &options, &[]);
        let expected = format!(
            "{}SELECT DISTINCT ?x WHERE {{\n?x a ?y\n}}\nOFFSET 5\nLIMIT 10",
            registry().sparql_declarations(&[])
        );
        assert_eq!(sparql, expected);
    }

    #[test]
    fn select_clause_order_is_fixed() {
        let connector = connector(None);
        let options = QueryOptions::new().order_by("?y").offset(5).limit(10);
        let sparql = connector.sparql_for_select(&["?x", "?y"], "?x a ?y", &options, &[]);
        assert!(sparql.ends_with(
            "SELECT ?x ?y WHERE {\n?x a ?y\n}\nORDER BY ?y\nOFFSET 5\nLIMIT 10"
        ));
    }

    #[test]
    fn select_without_options_has_no_trailing_clauses() {
        let connector = connector(None);
        let sparql =
            connector.sparql_for_select(&["?x"], "?x a ?y", &QueryOptions::new(), &[]);
        assert!(sparql.ends_with("SELECT ?x WHERE {\n?x a ?y\n}"));
    }

    #[test]
    fn select_count_ignores_order_by() {
        let connector = connector(None);
        let options = QueryOptions::new().distinct().order_by("?x").limit(1);
        let sparql = connector.sparql_for_select_count("?x", "?x a ?y", &options, &[]);
        assert!(sparql
            .ends_with("SELECT (COUNT(DISTINCT ?x) AS ?count) WHERE {\n?x a ?y\n}\nLIMIT 1"));
        assert!(!sparql.contains("ORDER BY"));
    }

    #[test]
    fn extra_namespaces_are_declared_after_core_set() {
        let connector = connector(None);
        let sparql = connector.sparql_for_select(
            &["?x"],
            "?x a ?y",
            &QueryOptions::new(),
            &[("foaf", "http://xmlns.com/foaf/0.1/"), ("xsd", "http://example.org/fake#")],
        );
        assert!(sparql.contains("PREFIX foaf: <http://xmlns.com/foaf/0.1/>\n"));
        // The colliding xsd extra is dropped, not re-declared.
        assert_eq!(sparql.matches("PREFIX xsd:").count(), 1);
    }

    #[test]
    fn data_update_wraps_in_graph_when_configured() {
        let connector = connector(Some("http://example.org/graph"));
        let sparql = connector.sparql_for_data_update(
            "INSERT",
            "wiki:A property:B wiki:C .",
            &[],
        );
        assert!(sparql.ends_with(
            "INSERT DATA {\nGRAPH <http://example.org/graph> {\nwiki:A property:B wiki:C .\n}\n}"
        ));

        let connector = self::connector(None);
        let sparql = connector.sparql_for_data_update(
            "DELETE",
            "wiki:A property:B wiki:C .",
            &[],
        );
        assert!(sparql.ends_with("DELETE DATA {\nwiki:A property:B wiki:C .\n}"));
    }

    #[test]
    fn with_clause_follows_default_graph() {
        assert_eq!(
            connector(Some("http://example.org/graph")).with_clause(),
            "WITH <http://example.org/graph>\n"
        );
        assert_eq!(connector(None).with_clause(), "");
    }

    #[test]
    fn data_url_targets_graph_or_default() {
        let endpoint = Url::parse("http://localhost:8890/sparql-graph-crud").unwrap();

        let url = connector(Some("http://example.org/graph")).data_url(&endpoint);
        assert_eq!(
            url.as_str(),
            "http://localhost:8890/sparql-graph-crud?graph=http%3A%2F%2Fexample.org%2Fgraph"
        );

        let url = connector(None).data_url(&endpoint);
        assert_eq!(url.as_str(), "http://localhost:8890/sparql-graph-crud?default");
    }
}
