//! Oracle dialect implementation.

use crate::models::AxisIncrement;

use super::{DatabaseType, Dialect, LimitClause};

#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String {
        match increment {
            AxisIncrement::Day => format!("TRUNC({column_sql})"),
            AxisIncrement::Month => format!("TO_CHAR({column_sql}, 'YYYY-MM')"),
            AxisIncrement::Quarter => {
                format!("TO_CHAR({column_sql}, 'YYYY') || 'Q' || TO_CHAR({column_sql}, 'Q')")
            }
            AxisIncrement::Year => format!("EXTRACT(YEAR FROM {column_sql})"),
        }
    }

    fn limit_clause(&self, n: u64) -> LimitClause {
        LimitClause::Trailing(format!("FETCH FIRST {n} ROWS ONLY"))
    }

    fn recursive_cte_keyword(&self) -> bool {
        false
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("TO_CHAR({expr})")
    }
}

/// Expression advancing `dt` by one step of `increment`.
pub(crate) fn next_step(increment: AxisIncrement, dt: &str) -> String {
    match increment {
        AxisIncrement::Day => format!("{dt} + 1"),
        AxisIncrement::Month => format!("ADD_MONTHS({dt}, 1)"),
        AxisIncrement::Quarter => format!("ADD_MONTHS({dt}, 3)"),
        AxisIncrement::Year => format!("ADD_MONTHS({dt}, 12)"),
    }
}

/// Axis bound as a DATE. A quoted string is read as ISO `YYYY-MM-DD`; any
/// other expression (`DATE '...'`, `SYSDATE`, a column) is already a date.
pub(crate) fn date_bound(expr: &str) -> String {
    let expr = expr.trim();
    if expr.starts_with('\'') {
        format!("TO_DATE({expr}, 'YYYY-MM-DD')")
    } else {
        expr.to_string()
    }
}
