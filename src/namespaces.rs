//! The namespace registry consulted when query and update texts are built.
//!
//! Every emitted SPARQL text starts with declarations for a fixed set of
//! short prefixes. Three of them (`wiki`, `swivt`, `property`) are
//! deployment-specific and injected by the host application; the W3C ones
//! are constant.

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// The prefixes declared at the start of every query and update, in emission
/// order.
pub const CORE_PREFIXES: [&str; 7] =
    ["wiki", "rdf", "rdfs", "owl", "swivt", "property", "xsd"];

/// Resolves short namespace prefixes to their full URIs.
///
/// The registry always contains the core prefix set. Caller-supplied extra
/// namespaces are appended per call when a declaration block is produced;
/// extras whose prefix collides with an already-registered one are dropped,
/// not re-declared.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    entries: Vec<(String, String)>,
}

impl NamespaceRegistry {
    /// Creates a registry from the three deployment-specific namespace URIs.
    /// `rdf`, `rdfs`, `owl` and `xsd` resolve to the W3C namespaces.
    pub fn new(
        wiki: impl Into<String>,
        swivt: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self {
            entries: vec![
                ("wiki".to_owned(), wiki.into()),
                ("rdf".to_owned(), RDF_NAMESPACE.to_owned()),
                ("rdfs".to_owned(), RDFS_NAMESPACE.to_owned()),
                ("owl".to_owned(), OWL_NAMESPACE.to_owned()),
                ("swivt".to_owned(), swivt.into()),
                ("property".to_owned(), property.into()),
                ("xsd".to_owned(), XSD_NAMESPACE.to_owned()),
            ],
        }
    }

    /// Registers an additional namespace that is declared on every emitted
    /// text, after the core set.
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        if !self.contains(&prefix) {
            self.entries.push((prefix, uri.into()));
        }
    }

    /// Resolves a registered prefix.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn contains(&self, prefix: &str) -> bool {
        self.entries.iter().any(|(p, _)| p == prefix)
    }

    /// The `PREFIX` declaration block for a SPARQL query or update,
    /// registered namespaces first, then non-colliding extras. One
    /// declaration per line, each line terminated by `\n`.
    pub fn sparql_declarations(&self, extra: &[(&str, &str)]) -> String {
        let mut block = String::new();
        for (prefix, uri) in &self.entries {
            block.push_str(&format!("PREFIX {prefix}: <{uri}>\n"));
        }
        for (prefix, uri) in extra {
            if !self.contains(prefix) {
                block.push_str(&format!("PREFIX {prefix}: <{uri}>\n"));
            }
        }
        block
    }

    /// The `@prefix` declaration block for a Turtle payload, same ordering
    /// and collision rules as [`Self::sparql_declarations`].
    pub fn turtle_declarations(&self, extra: &[(&str, &str)]) -> String {
        let mut block = String::new();
        for (prefix, uri) in &self.entries {
            block.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
        }
        for (prefix, uri) in extra {
            if !self.contains(prefix) {
                block.push_str(&format!("@prefix {prefix}: <{uri}> .\n"));
            }
        }
        block
    }
}
