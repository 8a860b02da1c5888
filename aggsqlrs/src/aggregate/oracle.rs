//! Oracle aggregate synthesis.
//!
//! The calendar is a recursive subquery factoring clause over `dual`. Pivot
//! columns are appended to a CLOB in a PL/SQL cursor loop, so the column list
//! is not bound by the 4000 byte limit of SQL string functions. The block
//! then opens a cursor over the final statement and returns it with
//! `DBMS_SQL.RETURN_RESULT` (Oracle 12c+).

use crate::config::AggsqlConfig;
use crate::dialect::oracle::{date_bound, next_step};
use crate::dialect::{Dialect, OracleDialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::Cte;

use super::axis::{DateAxis, AXIS_CTE};
use super::pivot::{plan_axis_pivot, plan_pivot, PivotPlan};
use super::{AggregateSynthesizer, Shape};

#[derive(Debug, Clone)]
pub struct OracleAggregates {
    axis_alias: String,
}

impl Default for OracleAggregates {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl OracleAggregates {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            axis_alias: config.defaults.axis_alias.clone(),
        }
    }

    fn pivot_script(&self, plan: &PivotPlan) -> String {
        let d = OracleDialect;
        let column = format!(
            "{} || '''' || REPLACE(piv, '''', '''''') || '''' || {} || '\"' || REPLACE(piv, '\"', '\"\"') || '\"'",
            d.quote_literal(&plan.column.prefix),
            d.quote_literal(&plan.column.infix),
        );
        let values = plan.census_with(&d, &format!("SELECT {column} AS pivot_column"));

        // NULL concatenates as the empty string, so an empty census needs no fallback
        let mut script = plan.pre_select.clone();
        script.push("DECLARE".to_string());
        script.push("pivot_columns CLOB;".to_string());
        script.push("pivot_cursor SYS_REFCURSOR;".to_string());
        script.push("BEGIN".to_string());
        script.push(format!("FOR pivot_value IN (\n{values}\nORDER BY rn\n) LOOP"));
        script.push("pivot_columns := pivot_columns || pivot_value.pivot_column;".to_string());
        script.push("END LOOP;".to_string());
        script.push(format!(
            "OPEN pivot_cursor FOR {} || pivot_columns || {};",
            d.quote_literal(&plan.head),
            d.quote_literal(&plan.tail),
        ));
        script.push("DBMS_SQL.RETURN_RESULT(pivot_cursor);".to_string());
        script.push("END;".to_string());
        script.join("\n")
    }
}

impl AggregateSynthesizer for OracleAggregates {
    fn dialect(&self) -> &dyn Dialect {
        &OracleDialect
    }

    fn axis_alias(&self) -> &str {
        &self.axis_alias
    }

    fn date_axis(&self, axis: &AxisSpec) -> DateAxis {
        let next = next_step(axis.increment, "dt");
        let body = format!(
            "SELECT {} FROM dual\nUNION ALL\nSELECT {next} FROM {AXIS_CTE}\nWHERE {next} <= {}",
            date_bound(&axis.start_date),
            date_bound(&axis.end_date)
        );
        DateAxis::new(Cte::recursive(AXIS_CTE, body).with_columns(&["dt"]))
    }

    fn build_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let plan = plan_pivot(&OracleDialect, request)?;
        Ok(self.pivot_script(&plan))
    }

    fn build_axis_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let spec = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
            shape: Shape::AxisPivot,
            field: "Axis",
        })?;
        let date_axis = self.date_axis(spec);
        let plan = plan_axis_pivot(&OracleDialect, &date_axis, &self.axis_alias, request)?;
        Ok(self.pivot_script(&plan))
    }
}
