//! DBML front-end and back-end.

mod generator;
mod parser;
mod types;

pub use generator::generate_dbml;
pub use parser::parse_dbml;
pub use types::{from_dbml, to_dbml};
