//! SQLite dialect implementation.

use crate::models::AxisIncrement;

use super::{DatabaseType, Dialect};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String {
        match increment {
            AxisIncrement::Day => format!("date({column_sql})"),
            AxisIncrement::Month => format!("strftime('%Y-%m', {column_sql})"),
            AxisIncrement::Quarter => format!(
                "strftime('%Y', {column_sql}) || 'Q' || ((CAST(strftime('%m', {column_sql}) AS INTEGER) + 2) / 3)"
            ),
            AxisIncrement::Year => format!("CAST(strftime('%Y', {column_sql}) AS INTEGER)"),
        }
    }
}

/// Modifier for `date(dt, ...)`.
pub(crate) fn date_modifier(increment: AxisIncrement) -> &'static str {
    match increment {
        AxisIncrement::Day => "+1 day",
        AxisIncrement::Month => "+1 month",
        AxisIncrement::Quarter => "+3 months",
        AxisIncrement::Year => "+1 year",
    }
}
