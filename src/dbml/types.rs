//! DBML type names to and from canonical column types.

use crate::model::ColumnType;

/// Look up a DBML type name. Unknown names are `None`; the caller decides
/// that this is an error.
pub fn from_dbml(name: &str) -> Option<ColumnType> {
    let base = name.split('(').next().unwrap_or(name).trim();
    let typ = match base.to_lowercase().as_str() {
        "int" | "integer" => ColumnType::Int,
        "bigint" => ColumnType::Bigint,
        "serial" => ColumnType::Serial,
        "varchar" => ColumnType::Varchar,
        "text" => ColumnType::Text,
        "boolean" | "bool" => ColumnType::Boolean,
        "date" => ColumnType::Date,
        "timestamp" => ColumnType::Timestamp,
        "float" => ColumnType::Float,
        "decimal" => ColumnType::Decimal,
        "uuid" => ColumnType::Uuid,
        "json" => ColumnType::Json,
        "blob" => ColumnType::Blob,
        _ => return None,
    };
    Some(typ)
}

pub fn to_dbml(typ: ColumnType) -> &'static str {
    match typ {
        ColumnType::Int => "int",
        ColumnType::Bigint => "bigint",
        ColumnType::Serial => "serial",
        ColumnType::Varchar => "varchar",
        ColumnType::Text => "text",
        ColumnType::Boolean => "boolean",
        ColumnType::Date => "date",
        ColumnType::Timestamp => "timestamp",
        ColumnType::Float => "float",
        ColumnType::Decimal => "decimal",
        ColumnType::Uuid => "uuid",
        ColumnType::Json => "json",
        ColumnType::Blob => "blob",
    }
}
