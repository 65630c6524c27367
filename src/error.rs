use reqwest::StatusCode;
use tracing::warn;

/// An error raised by a repository operation.
///
/// Only failures the caller can act on are raised: a query the store rejects,
/// a missing endpoint in the configuration, a broken transport setup. A store
/// that is temporarily unreachable is not an error — reads come back as a
/// [`ResultTable`](crate::ResultTable) flagged
/// [`ErrorCode::Unreachable`](crate::ErrorCode::Unreachable) and writes come
/// back as `Ok(false)`, so the host application can degrade instead of fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RepositoryError {
    /// The store answered HTTP 400: the submitted text is not a query or
    /// update it understands.
    #[error("the store at {endpoint} rejected the request as malformed (HTTP {http_code}): {query}")]
    MalformedQuery {
        /// The full query or update text as it was submitted.
        query: String,
        /// The endpoint the request went to.
        endpoint: String,
        http_code: u16,
    },
    /// The store answered HTTP 500: the request was understood but refused,
    /// e.g. because of resource limits or access rules.
    #[error("the store at {endpoint} refused the request (HTTP {http_code}): {query}")]
    QueryRefused {
        query: String,
        endpoint: String,
        http_code: u16,
    },
    /// The store answered with a status code outside the mapped set.
    #[error("unexpected answer from the store at {endpoint} (HTTP {http_code}): {query}")]
    OtherStoreError {
        query: String,
        endpoint: String,
        http_code: u16,
    },
    /// A write was attempted on a connector with no update endpoint, or a
    /// bulk load on a connector with no data endpoint. Raised before any
    /// network I/O.
    #[error("no {service} endpoint is configured for this repository")]
    NoService {
        /// Which endpoint was missing, `"update"` or `"data"`.
        service: &'static str,
    },
    /// The HTTP client could not be initialized. Only raised at connector
    /// construction, never by an operation.
    #[error("failed to set up the HTTP transport")]
    Transport(#[from] reqwest::Error),
}

/// What a failed exchange means for the caller.
#[derive(Debug)]
pub(crate) enum FailureOutcome {
    /// Expected transient unavailability: return a degraded result.
    Degrade,
    /// Caller-actionable failure: raise.
    Fail(RepositoryError),
}

/// Classifies a non-success HTTP status from the store.
///
/// 400 and 500 are the store talking about the request and are raised; 404
/// means the endpoint itself is gone and degrades like a dead transport;
/// everything else is unexpected and raised as [`RepositoryError::OtherStoreError`].
pub(crate) fn classify_status(
    status: StatusCode,
    query: &str,
    endpoint: &str,
) -> FailureOutcome {
    let http_code = status.as_u16();
    match http_code {
        400 => FailureOutcome::Fail(RepositoryError::MalformedQuery {
            query: query.to_owned(),
            endpoint: endpoint.to_owned(),
            http_code,
        }),
        500 => FailureOutcome::Fail(RepositoryError::QueryRefused {
            query: query.to_owned(),
            endpoint: endpoint.to_owned(),
            http_code,
        }),
        404 => {
            warn!(endpoint, http_code, "store endpoint not found, degrading");
            FailureOutcome::Degrade
        }
        _ => FailureOutcome::Fail(RepositoryError::OtherStoreError {
            query: query.to_owned(),
            endpoint: endpoint.to_owned(),
            http_code,
        }),
    }
}

/// Classifies a transport-level failure (DNS, connection refused, timeout).
/// These always degrade.
pub(crate) fn classify_transport(error: &reqwest::Error, endpoint: &str) -> FailureOutcome {
    warn!(endpoint, %error, "store unreachable, degrading");
    FailureOutcome::Degrade
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(code: u16) -> FailureOutcome {
        classify_status(
            StatusCode::from_u16(code).unwrap(),
            "SELECT ?x WHERE { ?x a ?y }",
            "http://localhost:8890/sparql",
        )
    }

    #[test]
    fn http_400_is_malformed_query() {
        let FailureOutcome::Fail(RepositoryError::MalformedQuery {
            query,
            endpoint,
            http_code,
        }) = classify(400)
        else {
            panic!("expected MalformedQuery");
        };
        assert_eq!(query, "SELECT ?x WHERE { ?x a ?y }");
        assert_eq!(endpoint, "http://localhost:8890/sparql");
        assert_eq!(http_code, 400);
    }

    #[test]
    fn http_500_is_query_refused() {
        assert!(matches!(
            classify(500),
            FailureOutcome::Fail(RepositoryError::QueryRefused { .. })
        ));
    }

    #[test]
    fn http_404_degrades() {
        assert!(matches!(classify(404), FailureOutcome::Degrade));
    }

    #[test]
    fn unmapped_statuses_are_other_store_errors() {
        for code in [401, 403, 409, 502, 503] {
            assert!(matches!(
                classify(code),
                FailureOutcome::Fail(RepositoryError::OtherStoreError { .. })
            ));
        }
    }
}
