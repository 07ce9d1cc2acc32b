//! SQL dialect selection and detection.

use std::fmt;
use std::str::FromStr;

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    PostgreSql,
    /// MySQL / MariaDB
    MySql,
    /// SQLite
    Sqlite,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown SQL dialect: {0} (expected postgresql, mysql or sqlite)")]
pub struct UnknownDialect(pub String);

impl Dialect {
    pub const ALL: [Dialect; 3] = [Self::PostgreSql, Self::MySql, Self::Sqlite];

    /// Name used in diagnostics and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Detect dialect from SQL content. Falls back to PostgreSQL.
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        // Check header comments
        if lower.contains("postgresql database dump") || lower.contains("pg_dump") {
            return Self::PostgreSql;
        }
        if lower.contains("mysql dump") || lower.contains("mysqldump") {
            return Self::MySql;
        }
        if lower.contains("pragma ") || lower.contains("sqlite") {
            return Self::Sqlite;
        }

        // Check dialect-only keywords
        if lower.contains("autoincrement") || lower.contains("without rowid") {
            return Self::Sqlite;
        }
        if lower.contains("auto_increment")
            || lower.contains("engine=")
            || lower.contains("unsigned")
            || lower.contains('`')
        {
            return Self::MySql;
        }

        Self::PostgreSql
    }
}

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_postgres() {
        let sql = "-- PostgreSQL database dump\nCREATE TABLE users (id SERIAL);";
        assert_eq!(Dialect::detect(sql), Dialect::PostgreSql);
    }

    #[test]
    fn test_detect_mysql() {
        let sql = "CREATE TABLE `users` (id INT AUTO_INCREMENT) ENGINE=InnoDB;";
        assert_eq!(Dialect::detect(sql), Dialect::MySql);
    }

    #[test]
    fn test_detect_sqlite() {
        let sql = "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT);";
        assert_eq!(Dialect::detect(sql), Dialect::Sqlite);
    }

    #[test]
    fn test_detect_defaults_to_postgres() {
        let sql = "CREATE TABLE users (id INTEGER PRIMARY KEY);";
        assert_eq!(Dialect::detect(sql), Dialect::PostgreSql);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::PostgreSql);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("sqlite".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
