//! SQL dialect syntax services.
//!
//! A dialect knows how to quote, escape and name things and how to bin a
//! date. Statement assembly lives in [`crate::aggregate`]; the dialect only
//! supplies the pieces, so no synthesizer hard-codes quoting rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AggsqlError, Result};
use crate::expr_utils::{runtime_name, split_alias, split_outermost_function};
use crate::models::AxisIncrement;

/// Where a dialect puts its row-limiting clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitClause {
    /// Directly after `SELECT` (`SELECT TOP 5 ...`).
    AfterSelect(String),
    /// After `ORDER BY` (`LIMIT 5`, `FETCH FIRST 5 ROWS ONLY`).
    Trailing(String),
}

pub trait Dialect: Send + Sync {
    fn database_type(&self) -> DatabaseType;

    fn quote_ident(&self, ident: &str) -> String;

    /// Escape text for use inside a single-quoted string literal.
    fn escape_literal(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    fn quote_literal(&self, text: &str) -> String {
        format!("'{}'", self.escape_literal(text))
    }

    fn alias_of(&self, fragment: &str) -> Option<String> {
        split_alias(fragment).1
    }

    /// Name of the column a fragment produces; fails rather than guessing
    /// when the fragment is a computed expression without an alias.
    fn runtime_name(&self, fragment: &str) -> Result<String> {
        self.alias_of(fragment)
            .or_else(|| runtime_name(fragment))
            .ok_or_else(|| AggsqlError::AmbiguousAlias(fragment.to_string()))
    }

    fn split_outermost_function(&self, expr: &str) -> Option<(String, String)> {
        split_outermost_function(expr)
    }

    /// Expression that bins `column_sql` to the granularity of `increment`.
    /// Axis dates and data dates go through the same expression so that
    /// they compare equal.
    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String;

    /// Whether conditional aggregation can be written `AGG(x) FILTER (WHERE ...)`.
    fn supports_filtered_aggregates(&self) -> bool {
        false
    }

    fn limit_clause(&self, n: u64) -> LimitClause {
        LimitClause::Trailing(format!("LIMIT {n}"))
    }

    /// Whether a recursive CTE must be introduced with `WITH RECURSIVE`.
    fn recursive_cte_keyword(&self) -> bool {
        true
    }

    /// Convert a value to text so it can be spliced into generated SQL.
    fn cast_to_text(&self, expr: &str) -> String {
        format!("CAST({expr} AS TEXT)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DatabaseType {
    MicrosoftSqlServer,
    MySql,
    PostgreSql,
    Oracle,
    Sqlite,
}

impl DatabaseType {
    pub const ALL: [DatabaseType; 5] = [
        DatabaseType::MicrosoftSqlServer,
        DatabaseType::MySql,
        DatabaseType::PostgreSql,
        DatabaseType::Oracle,
        DatabaseType::Sqlite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::MicrosoftSqlServer => "sqlserver",
            DatabaseType::MySql => "mysql",
            DatabaseType::PostgreSql => "postgres",
            DatabaseType::Oracle => "oracle",
            DatabaseType::Sqlite => "sqlite",
        }
    }

    /// The syntax service for this database.
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            DatabaseType::MicrosoftSqlServer => &SqlServerDialect,
            DatabaseType::MySql => &MySqlDialect,
            DatabaseType::PostgreSql => &PostgresDialect,
            DatabaseType::Oracle => &OracleDialect,
            DatabaseType::Sqlite => &SqliteDialect,
        }
    }
}

impl FromStr for DatabaseType {
    type Err = AggsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "microsoftsqlserver" => Ok(DatabaseType::MicrosoftSqlServer),
            "mysql" | "mariadb" => Ok(DatabaseType::MySql),
            "postgres" | "postgresql" | "pg" => Ok(DatabaseType::PostgreSql),
            "oracle" => Ok(DatabaseType::Oracle),
            "sqlite" => Ok(DatabaseType::Sqlite),
            other => Err(AggsqlError::Config(format!("unknown database type '{other}'"))),
        }
    }
}

impl TryFrom<String> for DatabaseType {
    type Error = AggsqlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DatabaseType> for String {
    fn from(value: DatabaseType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatabaseType::MicrosoftSqlServer => "Microsoft SQL Server",
            DatabaseType::MySql => "MySQL",
            DatabaseType::PostgreSql => "PostgreSQL",
            DatabaseType::Oracle => "Oracle",
            DatabaseType::Sqlite => "SQLite",
        };
        f.write_str(name)
    }
}

pub(crate) mod mysql;
pub(crate) mod oracle;
pub(crate) mod postgres;
pub(crate) mod sqlite;
pub(crate) mod sqlserver;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;
