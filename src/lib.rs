//! A synchronous client for the SPARQL 1.1 HTTP protocol.
//!
//! [`RepositoryConnector`] turns "run this query", "run this update",
//! "ping this endpoint" and "bulk-load this graph" into protocol exchanges
//! against a remote store, and turns the store's results-XML answer back
//! into an iterable [`ResultTable`].
//!
//! Failures follow a two-tier policy: problems the caller can fix — a
//! malformed query, a refused request, a missing endpoint in the
//! configuration — are raised as [`RepositoryError`]; a store that is
//! temporarily unreachable is not raised at all, reads come back as an
//! empty table flagged [`ErrorCode::Unreachable`] and writes as
//! `Ok(false)`, so the host application can degrade a feature instead of
//! failing a request.
//!
//! ```no_run
//! use sparql_repository::{
//!     EndpointConfig, NamespaceRegistry, QueryOptions, RepositoryConnector,
//! };
//!
//! # fn main() -> Result<(), sparql_repository::RepositoryError> {
//! let config = EndpointConfig::new("http://localhost:8890/sparql".parse().unwrap())
//!     .with_update_endpoint("http://localhost:8890/sparql-auth".parse().unwrap())
//!     .with_default_graph("http://example.org/graph");
//! let namespaces = NamespaceRegistry::new(
//!     "http://example.org/id/",
//!     "http://example.org/swivt/1.0#",
//!     "http://example.org/id/Property:",
//! );
//! let mut connector = RepositoryConnector::new(config, namespaces)?;
//!
//! let table = connector.select(
//!     &["?page"],
//!     "?page a swivt:Subject",
//!     &QueryOptions::new().limit(10),
//!     &[],
//! )?;
//! for row in &table {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod connector;
mod error;
pub mod namespaces;
mod results;

pub use config::{EndpointConfig, DEFAULT_CONNECT_TIMEOUT};
pub use connector::{QueryOptions, RepositoryConnector, ServiceTarget};
pub use error::RepositoryError;
pub use namespaces::NamespaceRegistry;
pub use results::{ErrorCode, ResultRow, ResultTable, ResultTerm};
