//! SQL type spellings to and from canonical column types.

use super::Dialect;
use crate::model::ColumnType;
use regex::Regex;
use std::sync::LazyLock;

/// Ordered pattern rules; the first match wins. Prefix-sensitive
/// spellings must precede the generic rule they would otherwise hit.
static TYPE_RULES: LazyLock<Vec<(Regex, ColumnType)>> = LazyLock::new(|| {
    [
        (r"^(BIGSERIAL|SERIAL8)\b", ColumnType::Bigint),
        (r"^(SMALLSERIAL|SERIAL2|SERIAL4|SERIAL)\b", ColumnType::Serial),
        (r"^TINYINT\s*\(\s*1\s*\)", ColumnType::Boolean),
        (r"^(BIGINT|INT8)\b", ColumnType::Bigint),
        (r"^(TINYINT|SMALLINT|MEDIUMINT|INTEGER|INT2|INT4|INT)\b", ColumnType::Int),
        (r"^(BOOLEAN|BOOL)\b", ColumnType::Boolean),
        (r"^(TIMESTAMPTZ|TIMESTAMP|DATETIME2|DATETIME)\b", ColumnType::Timestamp),
        (r"^DATE\b", ColumnType::Date),
        (
            r"^(CHARACTER\s+VARYING|VARCHAR2|VARCHAR|NVARCHAR|CHARACTER|NCHAR|CHAR)\b",
            ColumnType::Varchar,
        ),
        (r"^(TINYTEXT|MEDIUMTEXT|LONGTEXT|TEXT|CLOB)\b", ColumnType::Text),
        (r"^(DECIMAL|NUMERIC|MONEY)\b", ColumnType::Decimal),
        (r"^(DOUBLE|FLOAT4|FLOAT8|FLOAT|REAL)\b", ColumnType::Float),
        (r"^(UUID|UNIQUEIDENTIFIER)\b", ColumnType::Uuid),
        (r"^(JSONB|JSON)\b", ColumnType::Json),
        (
            r"^(TINYBLOB|MEDIUMBLOB|LONGBLOB|BLOB|BYTEA|VARBINARY|BINARY)\b",
            ColumnType::Blob,
        ),
    ]
    .into_iter()
    .map(|(pattern, typ)| {
        let re = Regex::new(&format!("(?i){}", pattern)).expect("type rule pattern is valid");
        (re, typ)
    })
    .collect()
});

/// Map a raw SQL type spelling to its canonical type. Unknown types are TEXT.
pub fn map_sql_type(raw: &str) -> ColumnType {
    let raw = raw.trim();
    TYPE_RULES
        .iter()
        .find(|(re, _)| re.is_match(raw))
        .map(|(_, typ)| *typ)
        .unwrap_or(ColumnType::Text)
}

/// Whether `raw` starts with a type spelling the rules recognize.
pub(crate) fn is_known_sql_type(raw: &str) -> bool {
    let raw = raw.trim();
    TYPE_RULES.iter().any(|(re, _)| re.is_match(raw))
}

/// Dialect spelling of a canonical type.
pub fn render_type(typ: ColumnType, dialect: Dialect) -> &'static str {
    use ColumnType::*;

    match dialect {
        Dialect::PostgreSql => match typ {
            Int => "INTEGER",
            Bigint => "BIGINT",
            Serial => "SERIAL",
            Varchar => "VARCHAR(255)",
            Text => "TEXT",
            Boolean => "BOOLEAN",
            Date => "DATE",
            Timestamp => "TIMESTAMP",
            Float => "DOUBLE PRECISION",
            Decimal => "DECIMAL(10,2)",
            Uuid => "UUID",
            Json => "JSONB",
            Blob => "BYTEA",
        },
        Dialect::MySql => match typ {
            Int | Serial => "INT",
            Bigint => "BIGINT",
            Varchar => "VARCHAR(255)",
            Text => "TEXT",
            Boolean => "BOOLEAN",
            Date => "DATE",
            Timestamp => "DATETIME",
            Float => "DOUBLE",
            Decimal => "DECIMAL(10,2)",
            Uuid => "CHAR(36)",
            Json => "JSON",
            Blob => "BLOB",
        },
        Dialect::Sqlite => match typ {
            Int | Bigint | Serial | Boolean => "INTEGER",
            Varchar | Text | Date | Timestamp | Uuid | Json => "TEXT",
            Float => "REAL",
            Decimal => "NUMERIC",
            Blob => "BLOB",
        },
    }
}
