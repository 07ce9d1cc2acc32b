//! SQL parser for CREATE TABLE statements.

use super::dialect::Dialect;
use super::types::{is_known_sql_type, map_sql_type};
use crate::layout::GridLayout;
use crate::model::{
    Cardinality, Column, ColumnType, Constraints, Diagnostic, Endpoint, IdAllocator, ParseOutput,
    Position, Relationship, Table,
};
use crate::text::{
    blank_string_literals, find_closing_paren, line_at, split_statements, split_top_level,
    strip_sql_comments, unquote,
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, debug_span, trace};

/// Bare or quoted identifier.
const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|'[^']+'|\[[^\]]+\]|[\w$]+)"#;

fn pattern(template: &str) -> Regex {
    Regex::new(&template.replace("{IDENT}", IDENT)).expect("SQL pattern is valid")
}

static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^CREATE\s+(?:(?:TEMP|TEMPORARY)\s+)?TABLE\b"));
static CREATE_TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?is)^CREATE\s+(?:(?:TEMP|TEMPORARY)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:{IDENT}\s*\.\s*)?(?P<name>{IDENT})\s*\(",
    )
});
static ALTER_FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?is)^ALTER\s+TABLE\s+(?:ONLY\s+)?(?:IF\s+EXISTS\s+)?(?:{IDENT}\s*\.\s*)?(?P<table>{IDENT})\s+ADD\s+(?:CONSTRAINT\s+{IDENT}\s+)?FOREIGN\s+KEY\s*\((?P<cols>[^)]*)\)\s*REFERENCES\s+(?:{IDENT}\s*\.\s*)?(?P<ref>{IDENT})\s*(?:\((?P<refcols>[^)]*)\))?",
    )
});
static TABLE_PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^PRIMARY\s+KEY\s*\((?P<cols>[^)]*)\)"));
static TABLE_FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?is)^FOREIGN\s+KEY\s*(?:{IDENT}\s*)?\((?P<cols>[^)]*)\)\s*REFERENCES\s+(?:{IDENT}\s*\.\s*)?(?P<ref>{IDENT})\s*(?:\((?P<refcols>[^)]*)\))?",
    )
});
static TABLE_UNIQUE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?is)^UNIQUE\b\s*(?:(?:KEY|INDEX)\b\s*)?(?:{IDENT}\s*)?\((?P<cols>[^)]*)\)")
});
static NAMED_CONSTRAINT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)^CONSTRAINT\s+{IDENT}\s+(?P<rest>.+)$"));
/// Index and check definitions. A bare `key TEXT` is a column, so the
/// keyword must be followed by its column list.
static SKIPPED_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?is)^(?:(?:KEY|INDEX)|(?:FULLTEXT|SPATIAL)(?:\s+(?:KEY|INDEX))?)\b\s*(?:(?P<name>{IDENT})\s*)?\(|^CHECK\s*\(|^EXCLUDE\s+(?:USING\b|\()",
    )
});
static COLUMN_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?s)^(?P<name>{IDENT})(?:\s+(?P<type>[A-Za-z_]\w*(?:\s*\([^)]*\))?(?:\s*\[\s*\])*))?(?P<rest>.*)$",
    )
});
static INLINE_PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bPRIMARY\s+KEY\b"));
static INLINE_UNIQUE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bUNIQUE\b"));
static INLINE_NOT_NULL: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)\bNOT\s+NULL\b"));
static INLINE_AUTO_INCREMENT: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)\bAUTO_?INCREMENT\b"));
static INLINE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?is)\bREFERENCES\s+(?:{IDENT}\s*\.\s*)?(?P<ref>{IDENT})\s*(?:\(\s*(?P<refcol>{IDENT})\s*\))?",
    )
});

/// Words that start a column constraint rather than a type.
const CONSTRAINT_WORDS: &[&str] = &[
    "PRIMARY",
    "NOT",
    "NULL",
    "UNIQUE",
    "REFERENCES",
    "DEFAULT",
    "CHECK",
    "CONSTRAINT",
    "GENERATED",
    "COLLATE",
];

/// Parse a batch of CREATE TABLE statements.
///
/// Never fails: unsupported or malformed statements become diagnostics and
/// the remaining statements are still parsed.
pub fn parse_sql(input: &str, dialect: Dialect) -> ParseOutput {
    let span = debug_span!("parse_sql", %dialect, input_len = input.len());
    let _enter = span.enter();

    let stripped = strip_sql_comments(input);
    let mut parser = Parser::new(dialect);

    for (offset, statement) in split_statements(&stripped) {
        let trimmed = statement.trim_start();
        if trimmed.trim_end().is_empty() {
            continue;
        }
        let start = offset + (statement.len() - trimmed.len());
        parser.statement(trimmed.trim_end(), line_at(&stripped, start));
    }

    parser.finish()
}

struct Parser {
    dialect: Dialect,
    ids: IdAllocator,
    tables: Vec<Table>,
    references: Vec<ForeignKeyRef>,
    errors: Vec<Diagnostic>,
}

/// A foreign key as written, resolved by name once every table is known.
struct ForeignKeyRef {
    table: String,
    column: String,
    target: String,
    target_column: String,
}

enum Definition {
    PrimaryKey(Vec<String>),
    ForeignKey {
        columns: Vec<String>,
        target: String,
        target_columns: Vec<String>,
    },
    Unique(Vec<String>),
    Column(ColumnDefinition),
    Skipped,
    Invalid,
}

struct ColumnDefinition {
    name: String,
    typ: ColumnType,
    constraints: Constraints,
    reference: Option<(String, String)>,
}

impl Parser {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ids: IdAllocator::default(),
            tables: Vec::new(),
            references: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, line: usize, message: String) {
        trace!(line, %message, "diagnostic");
        self.errors.push(Diagnostic::new(line, message));
    }

    fn statement(&mut self, statement: &str, line: usize) {
        if CREATE_TABLE.is_match(statement) {
            self.create_table(statement, line);
        } else if let Some(caps) = ALTER_FOREIGN_KEY.captures(statement) {
            let table = unquote(&caps["table"]);
            let columns = name_list(&caps["cols"]);
            let target_columns = caps
                .name("refcols")
                .map(|m| name_list(m.as_str()))
                .unwrap_or_default();
            self.add_references(&table, columns, unquote(&caps["ref"]), target_columns);
        } else {
            let message = format!("[{}] Unsupported statement near line {}", self.dialect, line);
            self.error(line, message);
        }
    }

    fn create_table(&mut self, statement: &str, line: usize) {
        let located = CREATE_TABLE_HEADER.captures(statement).and_then(|caps| {
            let open = caps.get(0)?.end() - 1;
            let close = find_closing_paren(statement, open)?;
            Some((unquote(&caps["name"]), open, close))
        });
        let Some((name, open, close)) = located else {
            let message = format!(
                "[{}] Could not locate the column list of CREATE TABLE near line {}",
                self.dialect, line
            );
            self.error(line, message);
            return;
        };

        let mut table = Table {
            id: self.ids.table(),
            name,
            position: Position::default(),
            columns: Vec::new(),
        };
        let mut primary_key: Vec<String> = Vec::new();
        let mut unique_sets: Vec<Vec<String>> = Vec::new();

        let body = &statement[open + 1..close];
        for (offset, raw) in split_top_level(body, ',') {
            let definition = raw.trim();
            if definition.is_empty() {
                continue;
            }
            let leading = raw.len() - raw.trim_start().len();
            let def_line = line + line_at(statement, open + 1 + offset + leading) - 1;

            match classify(definition) {
                Definition::PrimaryKey(columns) => primary_key.extend(columns),
                Definition::Unique(columns) => unique_sets.push(columns),
                Definition::ForeignKey {
                    columns,
                    target,
                    target_columns,
                } => {
                    let table_name = table.name.clone();
                    self.add_references(&table_name, columns, target, target_columns);
                }
                Definition::Column(column) => {
                    if let Some((target, target_column)) = column.reference {
                        self.references.push(ForeignKeyRef {
                            table: table.name.clone(),
                            column: column.name.clone(),
                            target,
                            target_column,
                        });
                    }
                    table.columns.push(Column {
                        id: IdAllocator::column(table.columns.len()),
                        name: column.name,
                        typ: column.typ,
                        constraints: column.constraints,
                    });
                }
                Definition::Skipped => trace!(definition, "skipping table-level definition"),
                Definition::Invalid => {
                    let message = format!(
                        "[{}] Could not parse definition near line {}",
                        self.dialect, def_line
                    );
                    self.error(def_line, message);
                }
            }
        }

        // A composite key makes each member non-null, not individually unique.
        let single_key = primary_key.len() == 1;
        for name in &primary_key {
            if let Some(column) = table.column_named_mut(name) {
                column.constraints.is_primary_key = true;
                column.constraints.is_nullable = false;
                if single_key {
                    column.constraints.is_unique = true;
                }
            }
        }
        for set in unique_sets.iter().filter(|set| set.len() == 1) {
            if let Some(column) = table.column_named_mut(&set[0]) {
                column.constraints.is_unique = true;
            }
        }

        self.tables.push(table);
    }

    fn add_references(
        &mut self,
        table: &str,
        columns: Vec<String>,
        target: String,
        target_columns: Vec<String>,
    ) {
        for (i, column) in columns.into_iter().enumerate() {
            let target_column = target_columns
                .get(i)
                .cloned()
                .unwrap_or_else(|| "id".to_string());
            self.references.push(ForeignKeyRef {
                table: table.to_string(),
                column,
                target: target.clone(),
                target_column,
            });
        }
    }

    fn finish(mut self) -> ParseOutput {
        GridLayout::default().apply(&mut self.tables);

        let mut relationships: Vec<Relationship> = Vec::new();
        for reference in &self.references {
            let Some((owner, column_id, unique, source)) = resolve(&self.tables, reference) else {
                trace!(
                    table = %reference.table,
                    column = %reference.column,
                    target = %reference.target,
                    "dropping unresolved foreign key"
                );
                continue;
            };
            let target = Endpoint::new(self.tables[owner].id.clone(), column_id);
            if relationships
                .iter()
                .any(|r| r.source == source && r.target == target)
            {
                continue;
            }

            if let Some(column) = self.tables[owner]
                .columns
                .iter_mut()
                .find(|c| c.id == target.column_id)
            {
                column.constraints.is_foreign_key = true;
            }

            let cardinality = if unique {
                Cardinality::OneToOne
            } else {
                Cardinality::OneToMany
            };
            relationships.push(Relationship {
                id: self.ids.relationship(),
                cardinality,
                source,
                target,
            });
        }

        debug!(
            tables = self.tables.len(),
            relationships = relationships.len(),
            errors = self.errors.len(),
            "parsed SQL DDL"
        );

        ParseOutput {
            tables: self.tables,
            relationships,
            errors: self.errors,
        }
    }
}

/// Resolve a reference to (owning table index, referencing column id,
/// referencing column uniqueness, referenced endpoint).
fn resolve(tables: &[Table], reference: &ForeignKeyRef) -> Option<(usize, String, bool, Endpoint)> {
    let owner = table_index(tables, &reference.table)?;
    let column = tables[owner].column_named(&reference.column)?;
    let target_table = &tables[table_index(tables, &reference.target)?];
    let target_column = target_table.column_named(&reference.target_column)?;
    Some((
        owner,
        column.id.clone(),
        column.constraints.is_unique,
        Endpoint::new(target_table.id.clone(), target_column.id.clone()),
    ))
}

fn table_index(tables: &[Table], name: &str) -> Option<usize> {
    tables.iter().position(|t| t.name.eq_ignore_ascii_case(name))
}

fn classify(definition: &str) -> Definition {
    if let Some(caps) = TABLE_PRIMARY_KEY.captures(definition) {
        return Definition::PrimaryKey(name_list(&caps["cols"]));
    }
    if let Some(caps) = TABLE_FOREIGN_KEY.captures(definition) {
        return Definition::ForeignKey {
            columns: name_list(&caps["cols"]),
            target: unquote(&caps["ref"]),
            target_columns: caps
                .name("refcols")
                .map(|m| name_list(m.as_str()))
                .unwrap_or_default(),
        };
    }
    if let Some(caps) = TABLE_UNIQUE.captures(definition) {
        return Definition::Unique(name_list(&caps["cols"]));
    }
    if let Some(caps) = NAMED_CONSTRAINT.captures(definition) {
        return classify(caps["rest"].trim());
    }
    if let Some(caps) = SKIPPED_DEFINITION.captures(definition) {
        // `key VARCHAR(10)` names a column, not an index.
        let typed_column = caps
            .name("name")
            .is_some_and(|m| is_known_sql_type(m.as_str()));
        if !typed_column {
            return Definition::Skipped;
        }
    }
    parse_column(definition).map_or(Definition::Invalid, Definition::Column)
}

fn parse_column(definition: &str) -> Option<ColumnDefinition> {
    let caps = COLUMN_DEFINITION.captures(definition)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str());
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }

    // `id PRIMARY KEY`: the word after the name is a constraint, not a type.
    let (type_text, rest) = match caps.name("type") {
        Some(m) if is_constraint_word(m.as_str()) => (None, &definition[m.start()..]),
        Some(m) => (Some(m.as_str()), rest),
        None => (None, rest),
    };

    let scan = blank_string_literals(rest);
    let is_primary_key = INLINE_PRIMARY_KEY.is_match(&scan);
    let not_null = INLINE_NOT_NULL.is_match(&scan);
    let unique = INLINE_UNIQUE.is_match(&scan);

    let mut typ = type_text.map_or(ColumnType::Text, map_sql_type);
    if typ == ColumnType::Int && INLINE_AUTO_INCREMENT.is_match(&scan) {
        typ = ColumnType::Serial;
    }

    let reference = INLINE_REFERENCE.captures(&scan).map(|r| {
        let column = r
            .name("refcol")
            .map_or_else(|| "id".to_string(), |m| unquote(m.as_str()));
        (unquote(&r["ref"]), column)
    });

    Some(ColumnDefinition {
        name: unquote(&caps["name"]),
        typ,
        constraints: Constraints {
            is_primary_key,
            is_nullable: !(is_primary_key || not_null),
            is_unique: is_primary_key || unique,
            is_foreign_key: false,
        },
        reference,
    })
}

fn is_constraint_word(word: &str) -> bool {
    let head = word.split(|c: char| !c.is_alphanumeric() && c != '_').next().unwrap_or(word);
    CONSTRAINT_WORDS
        .iter()
        .any(|w| w.eq_ignore_ascii_case(head))
}

fn name_list(list: &str) -> Vec<String> {
    split_top_level(list, ',')
        .into_iter()
        .map(|(_, name)| unquote(name))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column<'a>(table: &'a Table, name: &str) -> &'a Column {
        table.column_named(name).unwrap()
    }

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                bio TEXT
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.tables.len(), 1);

        let users = &out.tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.id, "table-1");
        assert_eq!(users.columns.len(), 3);
        assert_eq!(users.columns[1].id, "col-2");

        let id = column(users, "id");
        assert_eq!(id.typ, ColumnType::Int);
        assert!(id.constraints.is_primary_key);
        assert!(id.constraints.is_unique);
        assert!(!id.constraints.is_nullable);

        let email = column(users, "email");
        assert_eq!(email.typ, ColumnType::Varchar);
        assert!(!email.constraints.is_nullable);
        assert!(email.constraints.is_unique);
        assert!(!email.constraints.is_primary_key);

        assert!(column(users, "bio").constraints.is_nullable);
    }

    #[test]
    fn test_inline_reference_direction() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (
                id INT PRIMARY KEY,
                user_id INT REFERENCES users(id)
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.tables.len(), 2);
        assert_eq!(out.relationships.len(), 1);

        let rel = &out.relationships[0];
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.source, Endpoint::new("table-1", "col-1"));
        assert_eq!(rel.target, Endpoint::new("table-2", "col-2"));
        assert!(column(&out.tables[1], "user_id").constraints.is_foreign_key);
        assert!(!column(&out.tables[0], "id").constraints.is_foreign_key);
    }

    #[test]
    fn test_unique_foreign_key_is_one_to_one() {
        let sql = "CREATE TABLE users(id INT PRIMARY KEY); \
                   CREATE TABLE profiles(id INT PRIMARY KEY, user_id INT UNIQUE, \
                   FOREIGN KEY(user_id) REFERENCES users(id));";

        let out = parse_sql(sql, Dialect::MySql);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.relationships.len(), 1);
        assert_eq!(out.relationships[0].cardinality, Cardinality::OneToOne);
    }

    #[test]
    fn test_empty_and_comment_only_input() {
        for input in ["", "   \n\t  ", "-- nothing here\n/* still nothing */;"] {
            let out = parse_sql(input, Dialect::PostgreSql);
            assert_eq!(out, ParseOutput::default(), "input {:?}", input);
        }
    }

    #[test]
    fn test_partial_success() {
        let sql = "CREATE TABLE users(id INT PRIMARY KEY); GARBAGE; \
                   CREATE TABLE posts(id INT PRIMARY KEY);";

        let out = parse_sql(sql, Dialect::Sqlite);
        assert_eq!(out.tables.len(), 2);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].message, "[sqlite] Unsupported statement near line 1");
    }

    #[test]
    fn test_diagnostic_line_numbers() {
        let sql = "CREATE TABLE a (id INT);\n\n-- a comment\nDROP TABLE b;\nCREATE TABLE c (id INT);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.tables.len(), 2);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 4);
        assert_eq!(
            out.errors[0].message,
            "[postgresql] Unsupported statement near line 4"
        );
    }

    #[test]
    fn test_decimal_is_not_split() {
        let sql = "CREATE TABLE prices (amount DECIMAL(10, 2) NOT NULL, label TEXT);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        let table = &out.tables[0];
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].typ, ColumnType::Decimal);
        assert!(!table.columns[0].constraints.is_nullable);
    }

    #[test]
    fn test_quoted_names_and_if_not_exists() {
        let sql = r#"
            CREATE TABLE IF NOT EXISTS "user accounts" ("user id" INT PRIMARY KEY);
            CREATE TABLE `orders` (`id` INT);
            CREATE TABLE 'items' (id INT);
            CREATE TABLE public.audit (id INT);
        "#;

        let out = parse_sql(sql, Dialect::MySql);
        let names: Vec<&str> = out.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["user accounts", "orders", "items", "audit"]);
        assert_eq!(out.tables[0].columns[0].name, "user id");
    }

    #[test]
    fn test_table_level_constraints() {
        let sql = r#"
            CREATE TABLE memberships (
                user_id INT,
                group_id INT,
                code VARCHAR(20),
                PRIMARY KEY (user_id, group_id),
                UNIQUE (code)
            );
            CREATE TABLE tags (
                id INT,
                CONSTRAINT pk_tags PRIMARY KEY (id)
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert!(out.errors.is_empty(), "{:?}", out.errors);

        let memberships = &out.tables[0];
        let user_id = column(memberships, "user_id");
        assert!(user_id.constraints.is_primary_key);
        assert!(!user_id.constraints.is_nullable);
        assert!(!user_id.constraints.is_unique);
        assert!(column(memberships, "code").constraints.is_unique);

        let id = column(&out.tables[1], "id");
        assert!(id.constraints.is_primary_key && id.constraints.is_unique);
    }

    #[test]
    fn test_named_foreign_key_constraint() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (
                id INT PRIMARY KEY,
                author INT NOT NULL,
                CONSTRAINT fk_posts_author FOREIGN KEY (author) REFERENCES users (id) ON DELETE CASCADE
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.relationships.len(), 1);
        assert_eq!(out.relationships[0].target.table_id, "table-2");
        assert!(column(&out.tables[1], "author").constraints.is_foreign_key);
    }

    #[test]
    fn test_unknown_type_defaults_to_text() {
        let out = parse_sql("CREATE TABLE shapes (area GEOMETRY, raw);", Dialect::PostgreSql);
        assert_eq!(out.tables[0].columns[0].typ, ColumnType::Text);
        assert_eq!(out.tables[0].columns[1].typ, ColumnType::Text);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn test_auto_increment_becomes_serial() {
        let sql = r#"
            CREATE TABLE users (
                id INT AUTO_INCREMENT PRIMARY KEY,
                name VARCHAR(255)
            ) ENGINE=InnoDB;
        "#;

        let out = parse_sql(sql, Dialect::MySql);
        let id = column(&out.tables[0], "id");
        assert_eq!(id.typ, ColumnType::Serial);
        assert!(id.constraints.is_primary_key);
    }

    #[test]
    fn test_unknown_reference_dropped_silently() {
        let sql = r#"
            CREATE TABLE posts (
                id INT PRIMARY KEY,
                user_id INT REFERENCES users(id),
                blog_id INT REFERENCES posts(missing)
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert!(out.relationships.is_empty());
        assert!(out.errors.is_empty());
        assert!(!column(&out.tables[0], "user_id").constraints.is_foreign_key);
    }

    #[test]
    fn test_alter_table_foreign_key() {
        let sql = r#"
            CREATE TABLE users (id SERIAL PRIMARY KEY);
            CREATE TABLE posts (id SERIAL PRIMARY KEY, user_id INTEGER NOT NULL);
            ALTER TABLE posts ADD CONSTRAINT fk_posts_user_id FOREIGN KEY (user_id) REFERENCES users(id);
            ALTER TABLE posts DROP COLUMN id;
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.relationships.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].message.contains("Unsupported statement"));
    }

    #[test]
    fn test_duplicate_reference_declared_twice() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE posts (
                user_id INT REFERENCES users(id),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );
        "#;

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.relationships.len(), 1);
    }

    #[test]
    fn test_missing_body_is_reported() {
        let sql = "CREATE TABLE broken AS SELECT 1;\nCREATE TABLE ok (id INT);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.tables.len(), 1);
        assert_eq!(out.tables[0].name, "ok");
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 1);
    }

    #[test]
    fn test_grid_positions() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT); \
                   CREATE TABLE c (id INT); CREATE TABLE d (id INT);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.tables[1].position, Position { x: 300.0, y: 0.0 });
        assert_eq!(out.tables[3].position, Position { x: 0.0, y: 250.0 });
    }

    #[test]
    fn test_string_defaults_do_not_leak_keywords() {
        let sql = "CREATE TABLE notes (status VARCHAR(20) DEFAULT 'NOT NULL UNIQUE');";

        let out = parse_sql(sql, Dialect::PostgreSql);
        let status = &out.tables[0].columns[0];
        assert!(status.constraints.is_nullable);
        assert!(!status.constraints.is_unique);
    }

    #[test]
    fn test_index_definitions_are_skipped() {
        let sql = r#"
            CREATE TABLE users (
                id INT NOT NULL,
                email VARCHAR(100),
                KEY idx_email (email),
                UNIQUE KEY uk_email (email),
                CHECK (id > 0)
            );
        "#;

        let out = parse_sql(sql, Dialect::MySql);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert_eq!(out.tables[0].columns.len(), 2);
        assert!(column(&out.tables[0], "email").constraints.is_unique);
    }

    #[test]
    fn test_type_less_primary_key() {
        let out = parse_sql("CREATE TABLE t (id PRIMARY KEY);", Dialect::Sqlite);
        let id = &out.tables[0].columns[0];
        assert_eq!(id.typ, ColumnType::Text);
        assert!(id.constraints.is_primary_key);
    }

    #[test]
    fn test_invalid_definition_is_reported() {
        let sql = "CREATE TABLE t (\n  id INT,\n  (oops)\n);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert_eq!(out.tables[0].columns.len(), 1);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 3);
    }

    #[test]
    fn test_keyword_named_columns_are_kept() {
        let sql = "CREATE TABLE settings (\n  key TEXT PRIMARY KEY,\n  value TEXT,\n  index INT,\n  \
                   check BOOLEAN,\n  spatial VARCHAR(20),\n  INDEX idx_value (value)\n);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let names: Vec<&str> = out.tables[0].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "value", "index", "check", "spatial"]);
        assert!(column(&out.tables[0], "key").constraints.is_primary_key);
        assert_eq!(column(&out.tables[0], "spatial").typ, ColumnType::Varchar);
    }

    #[test]
    fn test_stray_apostrophe_does_not_swallow_statements() {
        let sql = "CREATE TABLE a (id INT);\nit's garbage;\nCREATE TABLE b (id INT);";

        let out = parse_sql(sql, Dialect::PostgreSql);
        let names: Vec<&str> = out.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].line, 2);
    }
}
