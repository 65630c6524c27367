//! Tabular SPARQL results and the streaming XML parser that produces them.

mod xml;

pub(crate) use xml::parse_results_xml;

use crate::namespaces::XSD_NAMESPACE;
use std::slice;

/// An RDF term bound to a result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultTerm {
    /// A named resource.
    ///
    /// Blank nodes also arrive as this variant, with the store-local label
    /// prefixed by `_`. That conflates blank-node scope with URI identity;
    /// the encoding is kept for compatibility with the data already written
    /// by this client's exports.
    Resource {
        uri: String,
    },
    /// A literal value. `datatype: None` is a plain literal.
    Literal {
        value: String,
        datatype: Option<String>,
    },
}

impl ResultTerm {
    pub(crate) fn resource(uri: impl Into<String>) -> Self {
        Self::Resource { uri: uri.into() }
    }

    pub(crate) fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }
}

/// One result row. A cell is `None` when the store returned no binding for
/// that variable, which is distinct from a bound blank node.
pub type ResultRow = Vec<Option<ResultTerm>>;

/// Whether a [`ResultTable`] carries real data or stands in for a store that
/// could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NoError,
    /// The store was unreachable; the table is empty and the caller should
    /// degrade rather than fail.
    Unreachable,
}

/// A read-only 2-D view over the bindings a query returned.
///
/// The header records variable names in first-seen order; a variable's
/// position is its column index. Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    header: Vec<String>,
    rows: Vec<ResultRow>,
    error_code: ErrorCode,
}

impl ResultTable {
    pub(crate) fn new(header: Vec<String>, rows: Vec<ResultRow>) -> Self {
        Self {
            header,
            rows,
            error_code: ErrorCode::NoError,
        }
    }

    /// An empty table flagged as coming from an unreachable store.
    pub(crate) fn unreachable() -> Self {
        Self {
            header: Vec::new(),
            rows: Vec::new(),
            error_code: ErrorCode::Unreachable,
        }
    }

    /// The number of result rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    /// The variable names, in column order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The column index of a variable, if it occurs in the header.
    pub fn column(&self, variable: &str) -> Option<usize> {
        self.header.iter().position(|name| name == variable)
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Iterates over the rows. Calling `iter` again restarts from the first
    /// row.
    pub fn iter(&self) -> slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    /// Whether this is the result of an `ASK` query that answered true:
    /// exactly one row and one column holding the `xsd:boolean` literal
    /// `"true"`.
    pub fn is_boolean_true(&self) -> bool {
        self.single_cell().is_some_and(|cell| {
            matches!(
                cell,
                Some(ResultTerm::Literal { value, datatype: Some(datatype) })
                    if value == "true" && datatype == &xsd_type("boolean")
            )
        })
    }

    /// The value of a count-shaped result: exactly one row and one column
    /// holding an `xsd:integer` literal. Any other shape counts as `0`.
    pub fn numeric_value(&self) -> i64 {
        self.single_cell()
            .and_then(|cell| match cell {
                Some(ResultTerm::Literal {
                    value,
                    datatype: Some(datatype),
                }) if datatype == &xsd_type("integer") => value.parse().ok(),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn single_cell(&self) -> Option<&Option<ResultTerm>> {
        if self.header.len() == 1 && self.rows.len() == 1 {
            self.rows[0].first()
        } else {
            None
        }
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn xsd_type(local: &str) -> String {
    format!("{XSD_NAMESPACE}{local}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_table(value: &str, datatype: &str) -> ResultTable {
        ResultTable::new(
            vec!["count".to_owned()],
            vec![vec![Some(ResultTerm::typed_literal(value, xsd_type(datatype)))]],
        )
    }

    #[test]
    fn boolean_true_requires_exact_shape() {
        let table = count_table("true", "boolean");
        assert!(table.is_boolean_true());

        assert!(!count_table("false", "boolean").is_boolean_true());
        assert!(!count_table("true", "string").is_boolean_true());

        let two_columns = ResultTable::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![vec![
                Some(ResultTerm::typed_literal("true", xsd_type("boolean"))),
                None,
            ]],
        );
        assert!(!two_columns.is_boolean_true());
    }

    #[test]
    fn numeric_value_of_count_shape() {
        assert_eq!(count_table("42", "integer").numeric_value(), 42);
    }

    #[test]
    fn numeric_value_of_other_shapes_is_zero() {
        assert_eq!(count_table("42", "decimal").numeric_value(), 0);
        assert_eq!(count_table("not a number", "integer").numeric_value(), 0);

        let two_columns = ResultTable::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![vec![
                Some(ResultTerm::typed_literal("42", xsd_type("integer"))),
                None,
            ]],
        );
        assert_eq!(two_columns.numeric_value(), 0);
    }

    #[test]
    fn iteration_is_restartable() {
        let table = ResultTable::new(
            vec!["x".to_owned()],
            vec![
                vec![Some(ResultTerm::resource("http://example.org/a"))],
                vec![Some(ResultTerm::resource("http://example.org/b"))],
            ],
        );
        assert_eq!(table.iter().count(), 2);
        assert_eq!(table.iter().count(), 2);
        assert_eq!((&table).into_iter().count(), 2);
    }

    #[test]
    fn column_lookup() {
        let table = ResultTable::new(vec!["name".to_owned(), "age".to_owned()], Vec::new());
        assert_eq!(table.column("name"), Some(0));
        assert_eq!(table.column("age"), Some(1));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn unreachable_table_is_empty_and_flagged() {
        let table = ResultTable::unreachable();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.error_code(), ErrorCode::Unreachable);
    }
}
