//! DBML parser for `Table` blocks and `Ref:` lines.

use super::types::from_dbml;
use crate::layout::GridLayout;
use crate::model::{
    Cardinality, Column, Constraints, Diagnostic, Endpoint, IdAllocator, ParseOutput, Position,
    Relationship, Table,
};
use crate::text::{split_top_level, strip_line_comment, unquote};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, debug_span, trace};

/// Bare or double-quoted DBML name.
const NAME: &str = r#"(?:"[^"]+"|\w+)"#;

fn pattern(template: &str) -> Regex {
    Regex::new(&template.replace("{NAME}", NAME)).expect("DBML pattern is valid")
}

static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)^Table\s+(?:{NAME}\s*\.\s*)?(?P<name>{NAME})(?:\s+as\s+{NAME})?\s*(?:\[[^\]]*\])?\s*(?P<open>\{)?\s*(?P<close>\})?$",
    )
});
static REF_START: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^Ref\b"));
static REF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)^Ref(?:\s+{NAME})?\s*:\s*(?P<lt>{NAME})\s*\.\s*(?P<lc>{NAME})\s*(?P<op><>|<|>|-)\s*(?P<rt>{NAME})\s*\.\s*(?P<rc>{NAME})\s*(?:\[[^\]]*\])?$",
    )
});
static COLUMN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"^(?P<name>{NAME})\s+(?P<type>{NAME}(?:\s*\([^)]*\))?(?:\[\])?)\s*(?:\[(?P<settings>.*)\])?$",
    )
});
static INLINE_REF: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)^ref\s*:\s*(?P<op><>|<|>|-)\s*(?P<table>{NAME})\s*\.\s*(?P<column>{NAME})$")
});
static NOTE_LINE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)^note\s*:"));

/// Relationship symbol between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefOp {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RefOp {
    fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(Self::OneToOne),
            "<" => Some(Self::OneToMany),
            ">" => Some(Self::ManyToOne),
            "<>" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Cardinality, and whether the right-hand endpoint is the source.
    fn orientation(self) -> (Cardinality, bool) {
        match self {
            Self::OneToOne => (Cardinality::OneToOne, false),
            Self::OneToMany => (Cardinality::OneToMany, false),
            Self::ManyToOne => (Cardinality::OneToMany, true),
            Self::ManyToMany => (Cardinality::ManyToMany, false),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RefError {
    #[error("Ref references unknown table \"{0}\"")]
    UnknownTable(String),
    #[error("Ref references unknown column \"{0}.{1}\"")]
    UnknownColumn(String, String),
}

struct PendingRef {
    line: usize,
    left: (String, String),
    op: RefOp,
    right: (String, String),
    inline: bool,
}

struct OpenTable {
    table: Table,
    line: usize,
    depth: usize,
}

#[derive(Default)]
struct Parser {
    ids: IdAllocator,
    tables: Vec<Table>,
    current: Option<OpenTable>,
    refs: Vec<PendingRef>,
    errors: Vec<Diagnostic>,
}

/// Parse DBML text.
///
/// Never fails: bad lines become diagnostics. Columns with an unknown type
/// are dropped.
pub fn parse_dbml(input: &str) -> ParseOutput {
    let span = debug_span!("parse_dbml", input_len = input.len());
    let _enter = span.enter();

    let mut parser = Parser::default();
    for (index, raw) in input.lines().enumerate() {
        parser.line(index + 1, raw.trim());
    }
    parser.finish()
}

impl Parser {
    fn error(&mut self, line: usize, message: impl Into<String>) {
        let message = message.into();
        trace!(line, %message, "diagnostic");
        self.errors.push(Diagnostic::new(line, message));
    }

    fn line(&mut self, number: usize, line: &str) {
        let line = strip_line_comment(line, "//").trim_end();
        if line.is_empty() || line.starts_with("--") {
            return;
        }
        match self.current.take() {
            None => self.outside(number, line),
            Some(open) => self.inside(number, line, open),
        }
    }

    fn outside(&mut self, number: usize, line: &str) {
        if let Some(caps) = TABLE_HEADER.captures(line) {
            let table = Table {
                id: self.ids.table(),
                name: unquote(&caps["name"]),
                position: Position::default(),
                columns: Vec::new(),
            };
            if caps.name("open").is_some() && caps.name("close").is_some() {
                self.tables.push(table);
                return;
            }
            let depth = usize::from(caps.name("open").is_some());
            self.current = Some(OpenTable {
                table,
                line: number,
                depth,
            });
        } else if REF_START.is_match(line) {
            let parsed = REF_LINE.captures(line).and_then(|caps| {
                Some(PendingRef {
                    line: number,
                    left: (unquote(&caps["lt"]), unquote(&caps["lc"])),
                    op: RefOp::parse(&caps["op"])?,
                    right: (unquote(&caps["rt"]), unquote(&caps["rc"])),
                    inline: false,
                })
            });
            match parsed {
                Some(pending) => self.refs.push(pending),
                None => self.error(number, "Invalid Ref syntax"),
            }
        } else {
            self.error(number, "Unexpected line outside of a Table block");
        }
    }

    fn inside(&mut self, number: usize, line: &str, mut open: OpenTable) {
        if line.starts_with('{') {
            open.depth += 1;
        } else if line.starts_with('}') {
            open.depth = open.depth.saturating_sub(1);
            if open.depth == 0 {
                self.tables.push(open.table);
                return;
            }
        } else if open.depth <= 1
            && TABLE_HEADER.captures(line).is_some_and(|caps| caps.name("open").is_some())
        {
            // A new table starts before the open one was closed.
            let message = format!("Unclosed Table block \"{}\"", open.table.name);
            self.error(open.line, message);
            self.tables.push(open.table);
            self.outside(number, line);
            return;
        } else if open.depth > 1 {
            // Inside `indexes { ... }` or a similar nested block.
            if line.ends_with('{') {
                open.depth += 1;
            }
        } else {
            if open.depth == 0 {
                self.error(number, "Expected '{' after Table header");
                open.depth = 1;
            }
            if line.ends_with('{') {
                open.depth += 1;
            } else if !NOTE_LINE.is_match(line) {
                self.column(number, line, &mut open.table);
            }
        }
        self.current = Some(open);
    }

    fn column(&mut self, number: usize, line: &str, table: &mut Table) {
        let Some(caps) = COLUMN_LINE.captures(line) else {
            self.error(number, "Invalid column definition");
            return;
        };
        let name = unquote(&caps["name"]);
        let type_name = unquote(&caps["type"]);
        let Some(typ) = from_dbml(&type_name) else {
            self.error(
                number,
                format!("Unknown type \"{}\" for column \"{}\"", type_name, name),
            );
            return;
        };

        let mut constraints = Constraints::default();
        if let Some(settings) = caps.name("settings") {
            for (_, raw) in split_top_level(settings.as_str(), ',') {
                let token = raw.trim();
                match token.to_lowercase().as_str() {
                    "pk" | "primary key" => constraints.is_primary_key = true,
                    "unique" => constraints.is_unique = true,
                    "null" => constraints.is_nullable = true,
                    "not null" => constraints.is_nullable = false,
                    "increment" | "" => {}
                    lower if lower.starts_with("ref") => {
                        let pending = INLINE_REF.captures(token).and_then(|r| {
                            Some(PendingRef {
                                line: number,
                                left: (table.name.clone(), name.clone()),
                                op: RefOp::parse(&r["op"])?,
                                right: (unquote(&r["table"]), unquote(&r["column"])),
                                inline: true,
                            })
                        });
                        match pending {
                            Some(pending) => self.refs.push(pending),
                            None => trace!(token, "ignoring malformed inline ref"),
                        }
                    }
                    _ => trace!(token, "ignoring column setting"),
                }
            }
        }
        if constraints.is_primary_key {
            constraints.is_nullable = false;
            constraints.is_unique = true;
        }

        table.columns.push(Column {
            id: IdAllocator::column(table.columns.len()),
            name,
            typ,
            constraints,
        });
    }

    fn finish(mut self) -> ParseOutput {
        if let Some(open) = self.current.take() {
            let message = format!("Unclosed Table block \"{}\"", open.table.name);
            self.error(open.line, message);
            self.tables.push(open.table);
        }

        GridLayout::default().apply(&mut self.tables);

        let mut relationships = Vec::new();
        for pending in std::mem::take(&mut self.refs) {
            match self.resolve(&pending) {
                Ok(relationship) => relationships.push(relationship),
                Err(err) if pending.inline => trace!(%err, "dropping unresolved inline ref"),
                Err(err) => self.error(pending.line, err.to_string()),
            }
        }

        debug!(
            tables = self.tables.len(),
            relationships = relationships.len(),
            errors = self.errors.len(),
            "parsed DBML"
        );

        ParseOutput {
            tables: self.tables,
            relationships,
            errors: self.errors,
        }
    }

    fn resolve(&mut self, pending: &PendingRef) -> Result<Relationship, RefError> {
        let (cardinality, swapped) = pending.op.orientation();
        let (source, target) = if swapped {
            (&pending.right, &pending.left)
        } else {
            (&pending.left, &pending.right)
        };
        let source = self.endpoint(source)?;
        let target = self.endpoint(target)?;

        // The target side holds the reference.
        if cardinality.is_foreign_key() {
            if let Some(column) = self
                .tables
                .iter_mut()
                .find(|t| t.id == target.table_id)
                .and_then(|t| t.columns.iter_mut().find(|c| c.id == target.column_id))
            {
                column.constraints.is_foreign_key = true;
            }
        }

        Ok(Relationship {
            id: self.ids.relationship(),
            cardinality,
            source,
            target,
        })
    }

    fn endpoint(&self, (table, column): &(String, String)) -> Result<Endpoint, RefError> {
        let found = self
            .tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(table))
            .ok_or_else(|| RefError::UnknownTable(table.clone()))?;
        let col = found
            .column_named(column)
            .ok_or_else(|| RefError::UnknownColumn(table.clone(), column.clone()))?;
        Ok(Endpoint::new(found.id.clone(), col.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnType;

    fn table<'a>(out: &'a ParseOutput, name: &str) -> &'a Table {
        out.tables.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_parse_table() {
        let input = r#"
            Table users {
              id serial [pk, increment]
              email varchar [unique, not null]
              nickname varchar
              bio text [null]
            }
        "#;

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let users = table(&out, "users");
        assert_eq!(users.columns.len(), 4);

        let id = &users.columns[0];
        assert_eq!(id.typ, ColumnType::Serial);
        assert!(id.constraints.is_primary_key);
        assert!(!id.constraints.is_nullable);

        let email = &users.columns[1];
        assert!(email.constraints.is_unique);
        assert!(!email.constraints.is_nullable);

        assert!(users.columns[2].constraints.is_nullable);
        assert!(users.columns[3].constraints.is_nullable);
    }

    #[test]
    fn test_brace_on_its_own_line() {
        let input = "Table users\n{\n  id int [pk]\n}\n";

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_greater_than_swaps_direction() {
        let input = r#"
            Table users {
              id int [pk]
            }
            Table posts {
              id int [pk]
              user_id int
            }
            Ref: posts.user_id > users.id
        "#;

        let out = parse_dbml(input);
        assert_eq!(out.relationships.len(), 1);
        let rel = &out.relationships[0];
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.source.table_id, table(&out, "users").id);
        assert_eq!(rel.target.table_id, table(&out, "posts").id);
        assert!(table(&out, "posts").columns[1].constraints.is_foreign_key);
    }

    #[test]
    fn test_ref_symbols() {
        let input = r#"
            Table a {
              id int
            }
            Table b {
              id int
            }
            Ref: a.id - b.id
            Ref: a.id < b.id
            Ref: a.id <> b.id
        "#;

        let out = parse_dbml(input);
        let kinds: Vec<Cardinality> = out.relationships.iter().map(|r| r.cardinality).collect();
        assert_eq!(
            kinds,
            vec![
                Cardinality::OneToOne,
                Cardinality::OneToMany,
                Cardinality::ManyToMany
            ]
        );
        for rel in &out.relationships {
            assert_eq!(rel.source.table_id, table(&out, "a").id);
        }
    }

    #[test]
    fn test_inline_ref() {
        let input = r#"
            Table users {
              id int [pk]
            }
            Table posts {
              id int [pk]
              user_id int [not null, ref: > users.id]
              editor_id int [ref: > editors.id]
            }
        "#;

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.relationships.len(), 1);
        assert_eq!(out.relationships[0].source.table_id, table(&out, "users").id);
        assert!(!table(&out, "posts").columns[1].constraints.is_nullable);
    }

    #[test]
    fn test_unknown_type_drops_column() {
        let input = "Table shapes {\n  id int\n  area geometry\n}";

        let out = parse_dbml(input);
        assert_eq!(out.tables[0].columns.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 3);
        assert!(out.errors[0].message.contains("geometry"));
    }

    #[test]
    fn test_unclosed_table() {
        let input = "Table users {\n  id int\n";

        let out = parse_dbml(input);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].columns.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].message.contains("Unclosed Table block"));
        assert_eq!(out.errors[0].line, 1);
    }

    #[test]
    fn test_unclosed_table_before_next_table() {
        let input = "Table a {\n  id int\nTable b {\n  id int\n}\n";

        let out = parse_dbml(input);
        let names: Vec<&str> = out.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(out.tables[1].columns.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].message, "Unclosed Table block \"a\"");
        assert_eq!(out.errors[0].line, 1);
    }

    #[test]
    fn test_trailing_comments() {
        let input = "Table t { // settings\n  id int [pk] // surrogate\n  name varchar [note: 'a // b']\n}\n";

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let names: Vec<&str> = out.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(out.tables[0].columns[0].constraints.is_primary_key);
    }

    #[test]
    fn test_bad_lines_outside_tables() {
        let input = "Table a {\n  id int\n}\nEnum status {\nRef: a.id >> b.id\nRef: a.id > missing.id\nRef: a.id > a.nope";

        let out = parse_dbml(input);
        assert_eq!(out.tables.len(), 1);
        assert!(out.relationships.is_empty());
        let lines: Vec<usize> = out.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![4, 5, 6, 7]);
        assert_eq!(out.errors[1].message, "Invalid Ref syntax");
        assert_eq!(out.errors[2].message, "Ref references unknown table \"missing\"");
        assert_eq!(out.errors[3].message, "Ref references unknown column \"a.nope\"");
    }

    #[test]
    fn test_empty_and_comments() {
        assert_eq!(parse_dbml(""), ParseOutput::default());
        assert_eq!(parse_dbml("  \n\n"), ParseOutput::default());
        assert_eq!(parse_dbml("// note\n-- another\n"), ParseOutput::default());
    }

    #[test]
    fn test_nested_blocks_and_notes() {
        let input = r#"
            Table "order items" as oi [headercolor: #3498DB] {
              "item id" int [pk, note: 'primary, surrogate']
              qty int [default: 1]
              Note: 'line items'
              indexes {
                (qty) [name: 'idx_qty']
              }
            }
        "#;

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let t = &out.tables[0];
        assert_eq!(t.name, "order items");
        assert_eq!(t.columns.len(), 2);
        assert_eq!(t.columns[0].name, "item id");
    }

    #[test]
    fn test_case_insensitive_resolution() {
        let input = "Table Users {\n  ID int\n}\nTable posts {\n  uid int\n}\nRef: posts.uid > users.id";

        let out = parse_dbml(input);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.relationships.len(), 1);
    }

    #[test]
    fn test_positions_and_ids() {
        let input = "Table a {\n}\nTable b {\n}\nTable c {\n}\nTable d {\n}";

        let out = parse_dbml(input);
        let ids: Vec<&str> = out.tables.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["table-1", "table-2", "table-3", "table-4"]);
        assert_eq!(out.tables[2].position, Position { x: 600.0, y: 0.0 });
        assert_eq!(out.tables[3].position, Position { x: 0.0, y: 250.0 });
    }
}
