//! Canonical graph to dialect-specific DDL.

use super::dialect::Dialect;
use super::types::render_type;
use crate::model::{Cardinality, Column, ColumnType, DiagramSchema, Table};
use std::collections::VecDeque;
use tracing::{debug, debug_span, trace};

/// A relationship whose endpoints resolved against the schema.
struct Link<'a> {
    cardinality: Cardinality,
    source_index: usize,
    source_table: &'a Table,
    source_column: &'a Column,
    target_index: usize,
    target_table: &'a Table,
    target_column: &'a Column,
}

/// Render a schema as DDL for `dialect`.
///
/// Tables come out parents first. Foreign keys of 1:1 and 1:N relationships
/// live on the target (referencing) table; N:M relationships get a junction
/// table.
pub fn generate_sql(schema: &DiagramSchema, dialect: Dialect) -> String {
    let span = debug_span!("generate_sql", %dialect, tables = schema.tables.len());
    let _enter = span.enter();

    let links = resolve_links(schema);
    let order = topological_order(schema.tables.len(), &links);

    let mut statements: Vec<String> = order
        .iter()
        .map(|&index| render_table(index, &schema.tables[index], &links, dialect))
        .collect();

    statements.extend(
        links
            .iter()
            .filter(|link| link.cardinality == Cardinality::ManyToMany)
            .map(|link| render_junction(link, dialect)),
    );

    match dialect {
        Dialect::PostgreSql | Dialect::MySql => statements.extend(
            links
                .iter()
                .filter(|link| link.cardinality.is_foreign_key())
                .map(|link| render_alter(link, dialect)),
        ),
        // SQLite cannot add constraints after the fact; they are inlined.
        Dialect::Sqlite => {}
    }

    debug!(statements = statements.len(), "generated SQL");

    if statements.is_empty() {
        return String::new();
    }
    let mut output = statements.join("\n\n");
    output.push('\n');
    output
}

fn resolve_links(schema: &DiagramSchema) -> Vec<Link<'_>> {
    let find = |table_id: &str, column_id: &str| {
        let index = schema.tables.iter().position(|t| t.id == table_id)?;
        let table = &schema.tables[index];
        Some((index, table, table.column(column_id)?))
    };

    schema
        .relationships
        .iter()
        .filter_map(|rel| {
            let source = find(&rel.source.table_id, &rel.source.column_id);
            let target = find(&rel.target.table_id, &rel.target.column_id);
            let (Some(source), Some(target)) = (source, target) else {
                trace!(relationship = %rel.id, "skipping unresolvable relationship");
                return None;
            };
            Some(Link {
                cardinality: rel.cardinality,
                source_index: source.0,
                source_table: source.1,
                source_column: source.2,
                target_index: target.0,
                target_table: target.1,
                target_column: target.2,
            })
        })
        .collect()
}

/// Kahn's algorithm over source -> target edges of 1:1 and 1:N links.
/// Ties keep the original table order; tables left on a cycle are appended
/// in original order.
fn topological_order(table_count: usize, links: &[Link<'_>]) -> Vec<usize> {
    let mut indegree = vec![0usize; table_count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); table_count];

    for link in links
        .iter()
        .filter(|l| l.cardinality.is_foreign_key() && l.source_index != l.target_index)
    {
        outgoing[link.source_index].push(link.target_index);
        indegree[link.target_index] += 1;
    }

    let mut queue: VecDeque<usize> = (0..table_count).filter(|&i| indegree[i] == 0).collect();
    let mut placed = vec![false; table_count];
    let mut order = Vec::with_capacity(table_count);

    while let Some(index) = queue.pop_front() {
        placed[index] = true;
        order.push(index);
        for &next in &outgoing[index] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    order.extend((0..table_count).filter(|&i| !placed[i]));
    order
}

fn render_table(index: usize, table: &Table, links: &[Link<'_>], dialect: Dialect) -> String {
    let key_count = table
        .columns
        .iter()
        .filter(|c| c.constraints.is_primary_key)
        .count();

    let mut trailing_key: Vec<String> = Vec::new();
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| render_column(column, dialect, key_count > 1, &mut trailing_key))
        .collect();

    if !trailing_key.is_empty() {
        lines.push(format!("PRIMARY KEY ({})", trailing_key.join(", ")));
    }

    if dialect == Dialect::Sqlite {
        lines.extend(
            links
                .iter()
                .filter(|link| link.cardinality.is_foreign_key() && link.target_index == index)
                .map(|link| {
                    foreign_key_clause(
                        &link.target_column.name,
                        link.source_table,
                        link.source_column,
                        dialect,
                    )
                }),
        );
    }

    create_table(&table.name, &lines, dialect)
}

fn render_column(
    column: &Column,
    dialect: Dialect,
    composite_key: bool,
    trailing_key: &mut Vec<String>,
) -> String {
    let constraints = &column.constraints;
    let name = quote_ident(&column.name, dialect);
    let typ = render_type(column.typ, dialect);
    let serial_key = constraints.is_primary_key && column.typ == ColumnType::Serial;

    let mut line = name.clone();
    match dialect {
        Dialect::PostgreSql => {
            line.push(' ');
            line.push_str(typ);
            if constraints.is_primary_key {
                if composite_key {
                    trailing_key.push(name);
                } else {
                    line.push_str(" PRIMARY KEY");
                }
            }
        }
        Dialect::MySql => {
            line.push(' ');
            line.push_str(typ);
            if constraints.is_primary_key {
                if serial_key {
                    line.push_str(" NOT NULL AUTO_INCREMENT");
                }
                trailing_key.push(name);
            }
        }
        Dialect::Sqlite => {
            if serial_key && !composite_key {
                line.push_str(" INTEGER PRIMARY KEY AUTOINCREMENT");
            } else {
                line.push(' ');
                line.push_str(typ);
                if constraints.is_primary_key {
                    trailing_key.push(name);
                }
            }
        }
    }

    if !constraints.is_nullable && !constraints.is_primary_key {
        line.push_str(" NOT NULL");
    }
    if constraints.is_unique && !constraints.is_primary_key {
        line.push_str(" UNIQUE");
    }
    line
}

fn render_junction(link: &Link<'_>, dialect: Dialect) -> String {
    let source = &link.source_table.name;
    let target = &link.target_table.name;
    let source_key = format!("{}_id", source);
    let mut target_key = format!("{}_id", target);
    if target_key == source_key {
        target_key = format!("related_{}", target_key);
    }

    let source_ref = quote_ident(&source_key, dialect);
    let target_ref = quote_ident(&target_key, dialect);
    let lines = vec![
        format!(
            "{} {} NOT NULL",
            source_ref,
            render_type(junction_type(link.source_column.typ), dialect)
        ),
        format!(
            "{} {} NOT NULL",
            target_ref,
            render_type(junction_type(link.target_column.typ), dialect)
        ),
        format!("PRIMARY KEY ({}, {})", source_ref, target_ref),
        foreign_key_clause(&source_key, link.source_table, link.source_column, dialect),
        foreign_key_clause(&target_key, link.target_table, link.target_column, dialect),
    ];

    create_table(&format!("{}_{}", source, target), &lines, dialect)
}

/// Junction keys store the referenced value, never generate one.
fn junction_type(typ: ColumnType) -> ColumnType {
    match typ {
        ColumnType::Serial => ColumnType::Int,
        other => other,
    }
}

fn render_alter(link: &Link<'_>, dialect: Dialect) -> String {
    let constraint = format!(
        "fk_{}_{}",
        link.target_table.name, link.target_column.name
    );
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {};",
        quote_ident(&link.target_table.name, dialect),
        quote_ident(&constraint, dialect),
        foreign_key_clause(
            &link.target_column.name,
            link.source_table,
            link.source_column,
            dialect
        )
    )
}

fn foreign_key_clause(
    column: &str,
    referenced_table: &Table,
    referenced_column: &Column,
    dialect: Dialect,
) -> String {
    format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        quote_ident(column, dialect),
        quote_ident(&referenced_table.name, dialect),
        quote_ident(&referenced_column.name, dialect)
    )
}

fn create_table(name: &str, lines: &[String], dialect: Dialect) -> String {
    let suffix = match dialect {
        Dialect::MySql => " ENGINE=InnoDB DEFAULT CHARSET=utf8mb4",
        Dialect::PostgreSql | Dialect::Sqlite => "",
    };
    let name = quote_ident(name, dialect);
    if lines.is_empty() {
        return format!("CREATE TABLE {} (\n){};", name, suffix);
    }
    format!(
        "CREATE TABLE {} (\n  {}\n){};",
        name,
        lines.join(",\n  "),
        suffix
    )
}

/// Words that open a table-level definition when they lead a line.
const RESERVED: &[&str] = &[
    "CHECK",
    "CONSTRAINT",
    "EXCLUDE",
    "FOREIGN",
    "FULLTEXT",
    "INDEX",
    "KEY",
    "PRIMARY",
    "SPATIAL",
    "UNIQUE",
];

/// Quote identifiers that are not plain `[A-Za-z_][A-Za-z0-9_]*`, and
/// reserved words.
fn quote_ident(name: &str, dialect: Dialect) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.iter().any(|w| w.eq_ignore_ascii_case(name));
    if plain {
        return name.to_string();
    }
    match dialect {
        Dialect::MySql => format!("`{}`", name.replace('`', "``")),
        Dialect::PostgreSql | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}
