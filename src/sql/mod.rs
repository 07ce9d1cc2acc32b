//! SQL DDL front-end and back-end.

mod dialect;
mod generator;
mod parser;
mod types;

pub use dialect::{Dialect, UnknownDialect};
pub use generator::generate_sql;
pub use parser::parse_sql;
pub use types::{map_sql_type, render_type};
