//! Streaming parser for the SPARQL Query Results XML Format.
//!
//! The document is processed in a single forward pass of quick-xml events;
//! no DOM is built. All parsing logic lives in transition functions over an
//! explicit [`ParserState`], so the state machine is testable without any
//! XML input at all. The quick-xml loop only decodes events and forwards
//! them.

use crate::results::{xsd_type, ResultRow, ResultTable, ResultTerm};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{trace, warn};

/// The element names the format defines. Anything else is carried as
/// [`Tag::Other`] so the stack still mirrors the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Sparql,
    Head,
    Variable,
    Results,
    Result,
    Binding,
    Uri,
    Literal,
    Bnode,
    Boolean,
    Other,
}

impl Tag {
    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"sparql" => Self::Sparql,
            b"head" => Self::Head,
            b"variable" => Self::Variable,
            b"results" => Self::Results,
            b"result" => Self::Result,
            b"binding" => Self::Binding,
            b"uri" => Self::Uri,
            b"literal" => Self::Literal,
            b"bnode" => Self::Bnode,
            b"boolean" => Self::Boolean,
            _ => Self::Other,
        }
    }
}

/// The datatype seen on the innermost open `<literal>`, kept apart from
/// "the innermost element is not a literal at all".
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingDatatype {
    NotLiteral,
    Plain,
    Typed(String),
}

/// Parser state, created fresh per document and discarded afterwards.
#[derive(Debug)]
struct ParserState {
    stack: Vec<Tag>,
    current_column: usize,
    pending_datatype: PendingDatatype,
}

impl ParserState {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            current_column: 0,
            pending_datatype: PendingDatatype::NotLiteral,
        }
    }

    fn innermost(&self) -> Option<Tag> {
        self.stack.last().copied()
    }
}

/// The table under construction.
#[derive(Debug, Default)]
struct TableBuilder {
    header: Vec<String>,
    rows: Vec<ResultRow>,
}

impl TableBuilder {
    fn set_current_cell(&mut self, column: usize, term: ResultTerm) {
        if let Some(row) = self.rows.last_mut() {
            if let Some(cell) = row.get_mut(column) {
                *cell = Some(term);
            }
        }
    }

    fn finish(self) -> ResultTable {
        ResultTable::new(self.header, self.rows)
    }
}

/// Handles an element-open event. `name` is the `name` attribute (variables
/// and bindings), `datatype` the `datatype` attribute (literals).
fn open_element(
    state: &mut ParserState,
    table: &mut TableBuilder,
    tag: Tag,
    name: Option<String>,
    datatype: Option<String>,
) {
    let parent = state.innermost();
    state.stack.push(tag);
    match tag {
        Tag::Variable if parent == Some(Tag::Head) => {
            if let Some(name) = name {
                if !table.header.contains(&name) {
                    table.header.push(name);
                }
            }
        }
        Tag::Result if parent == Some(Tag::Results) => {
            table.rows.push(vec![None; table.header.len()]);
        }
        Tag::Binding if parent == Some(Tag::Result) => {
            // A name that matches no declared variable leaves the column
            // index at its previous value.
            if let Some(column) = name
                .as_deref()
                .and_then(|name| table.header.iter().position(|header| header == name))
            {
                state.current_column = column;
            }
        }
        Tag::Literal if parent == Some(Tag::Binding) => {
            state.pending_datatype = match datatype {
                Some(datatype) => PendingDatatype::Typed(datatype),
                None => PendingDatatype::Plain,
            };
        }
        _ => {}
    }
}

fn close_element(state: &mut ParserState) {
    state.stack.pop();
}

/// Handles character data. Only text inside a term element or `<boolean>`
/// matters; whitespace between structural tags falls through untouched.
fn character_data(state: &mut ParserState, table: &mut TableBuilder, text: &str) {
    match state.innermost() {
        Some(Tag::Uri) => {
            table.set_current_cell(state.current_column, ResultTerm::resource(text));
        }
        Some(Tag::Literal) => {
            let datatype = match &state.pending_datatype {
                PendingDatatype::Typed(datatype) => Some(datatype.clone()),
                PendingDatatype::Plain | PendingDatatype::NotLiteral => None,
            };
            table.set_current_cell(
                state.current_column,
                ResultTerm::Literal {
                    value: text.to_owned(),
                    datatype,
                },
            );
        }
        Some(Tag::Bnode) => {
            table.set_current_cell(state.current_column, ResultTerm::resource(format!("_{text}")));
        }
        Some(Tag::Boolean) => {
            // ASK answers have no results/result wrapper; the whole table
            // collapses to a single boolean cell.
            table.header = vec![String::new()];
            table.rows = vec![vec![Some(ResultTerm::typed_literal(
                text,
                xsd_type("boolean"),
            ))]];
        }
        _ => {}
    }
}

fn decode_start(element: &BytesStart<'_>) -> (Tag, Option<String>, Option<String>) {
    let tag = Tag::from_local_name(element.local_name().as_ref());
    let mut name = None;
    let mut datatype = None;
    for attribute in element.attributes().flatten() {
        match attribute.key.local_name().as_ref() {
            b"name" => name = Some(String::from_utf8_lossy(&attribute.value).into_owned()),
            b"datatype" => {
                datatype = Some(String::from_utf8_lossy(&attribute.value).into_owned());
            }
            _ => {}
        }
    }
    (tag, name, datatype)
}

/// Parses a results document into a table.
///
/// Lenient on purpose: a document that breaks mid-stream yields the rows
/// accumulated up to the break, with a warning, rather than an error.
pub(crate) fn parse_results_xml(document: &str) -> ResultTable {
    let mut reader = Reader::from_str(document);
    let mut state = ParserState::new();
    let mut table = TableBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let (tag, name, datatype) = decode_start(&element);
                open_element(&mut state, &mut table, tag, name, datatype);
            }
            Ok(Event::Empty(element)) => {
                let (tag, name, datatype) = decode_start(&element);
                open_element(&mut state, &mut table, tag, name, datatype);
                close_element(&mut state);
            }
            Ok(Event::End(_)) => close_element(&mut state),
            Ok(Event::Text(text)) => match text.unescape() {
                Ok(text) => character_data(&mut state, &mut table, &text),
                Err(error) => {
                    warn!(%error, "stopping at undecodable text in results XML");
                    break;
                }
            },
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                character_data(&mut state, &mut table, &text);
            }
            Ok(Event::Comment(comment)) => {
                // Informational only.
                trace!(
                    comment = %String::from_utf8_lossy(&comment),
                    "comment in results XML"
                );
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "stopping at malformed results XML");
                break;
            }
        }
    }

    table.finish()
}
