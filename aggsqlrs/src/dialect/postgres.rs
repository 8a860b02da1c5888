//! PostgreSQL dialect implementation.

use crate::models::AxisIncrement;

use super::{DatabaseType, Dialect};

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSql
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn supports_filtered_aggregates(&self) -> bool {
        true
    }

    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String {
        match increment {
            AxisIncrement::Day => format!("CAST({column_sql} AS DATE)"),
            AxisIncrement::Month => format!("to_char({column_sql}, 'YYYY-MM')"),
            AxisIncrement::Quarter => format!("to_char({column_sql}, 'YYYY\"Q\"Q')"),
            AxisIncrement::Year => format!("CAST(date_part('year', {column_sql}) AS INTEGER)"),
        }
    }
}

/// Step of `generate_series` for an increment.
pub(crate) fn series_interval(increment: AxisIncrement) -> &'static str {
    match increment {
        AxisIncrement::Day => "1 day",
        AxisIncrement::Month => "1 month",
        AxisIncrement::Quarter => "3 months",
        AxisIncrement::Year => "1 year",
    }
}
