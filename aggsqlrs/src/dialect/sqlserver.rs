//! Microsoft SQL Server dialect implementation.

use crate::models::AxisIncrement;

use super::{DatabaseType, Dialect, LimitClause};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MicrosoftSqlServer
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn date_part_of_column(&self, increment: AxisIncrement, column_sql: &str) -> String {
        match increment {
            AxisIncrement::Day => format!("CAST({column_sql} AS DATE)"),
            // style 126 is ISO 8601, so the first 7 characters are yyyy-mm
            AxisIncrement::Month => format!("CONVERT(NVARCHAR(7), {column_sql}, 126)"),
            AxisIncrement::Quarter => format!(
                "CONVERT(NVARCHAR(4), {column_sql}, 126) + 'Q' + DATENAME(QUARTER, {column_sql})"
            ),
            AxisIncrement::Year => format!("YEAR({column_sql})"),
        }
    }

    fn limit_clause(&self, n: u64) -> LimitClause {
        LimitClause::AfterSelect(format!("TOP {n}"))
    }

    fn recursive_cte_keyword(&self) -> bool {
        false
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("CONVERT(NVARCHAR(MAX), {expr})")
    }
}

/// Unit name accepted by `DATEADD`.
pub(crate) fn dateadd_unit(increment: AxisIncrement) -> &'static str {
    match increment {
        AxisIncrement::Day => "DAY",
        AxisIncrement::Month => "MONTH",
        AxisIncrement::Quarter => "QUARTER",
        AxisIncrement::Year => "YEAR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_with_brackets() {
        assert_eq!(SqlServerDialect.quote_ident("a]b"), "[a]]b]");
    }

    #[test]
    fn bins_dates() {
        let d = SqlServerDialect;
        assert_eq!(d.date_part_of_column(AxisIncrement::Year, "dt"), "YEAR(dt)");
        assert_eq!(
            d.date_part_of_column(AxisIncrement::Month, "dt"),
            "CONVERT(NVARCHAR(7), dt, 126)"
        );
        assert!(d
            .date_part_of_column(AxisIncrement::Quarter, "dt")
            .contains("DATENAME(QUARTER, dt)"));
    }

    #[test]
    fn limits_with_top() {
        assert_eq!(
            SqlServerDialect.limit_clause(3),
            LimitClause::AfterSelect("TOP 3".to_string())
        );
    }
}
