//! MySQL dialect implementation.

use crate::models::AxisIncrement;

use super::{DatabaseType, Dialect};

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn escape_literal(&self, text: &str) -> String {
        // backslash is an escape character in the default sql_mode
        text.replace('\\', "\\\\").replace('\'', "''")
    }

    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String {
        match increment {
            AxisIncrement::Day => format!("DATE({column_sql})"),
            AxisIncrement::Month => format!("DATE_FORMAT({column_sql}, '%Y-%m')"),
            AxisIncrement::Quarter => {
                format!("CONCAT(YEAR({column_sql}), 'Q', QUARTER({column_sql}))")
            }
            AxisIncrement::Year => format!("YEAR({column_sql})"),
        }
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("CAST({expr} AS CHAR)")
    }
}

/// Unit keyword for `INTERVAL 1 <unit>`.
pub(crate) fn interval_unit(increment: AxisIncrement) -> &'static str {
    match increment {
        AxisIncrement::Day => "DAY",
        AxisIncrement::Month => "MONTH",
        AxisIncrement::Quarter => "QUARTER",
        AxisIncrement::Year => "YEAR",
    }
}
