//! SQL Server aggregate synthesis.
//!
//! The calendar is a recursive CTE over `DATEADD`, bounded by the
//! `@startDate`/`@endDate` variables. Pivot columns are folded with
//! `STRING_AGG` and the final statement runs through `sp_executesql`.

use crate::config::AggsqlConfig;
use crate::dialect::sqlserver::dateadd_unit;
use crate::dialect::{Dialect, SqlServerDialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::Cte;

use super::axis::{DateAxis, AXIS_CTE};
use super::pivot::{plan_axis_pivot, plan_pivot, PivotPlan};
use super::{AggregateSynthesizer, Shape};

#[derive(Debug, Clone)]
pub struct SqlServerAggregates {
    axis_alias: String,
    max_recursion: u32,
}

impl Default for SqlServerAggregates {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl SqlServerAggregates {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            axis_alias: config.defaults.axis_alias.clone(),
            max_recursion: config.sqlserver.max_recursion,
        }
    }

    fn pivot_script(&self, plan: &PivotPlan, axis_parameters: bool) -> String {
        let d = SqlServerDialect;
        let column = format!(
            "N{} + '''' + REPLACE(piv, '''', '''''') + '''' + N{} + '[' + REPLACE(piv, ']', ']]') + ']'",
            d.quote_literal(&plan.column.prefix),
            d.quote_literal(&plan.column.infix),
        );
        let collect = format!(
            "SELECT @columns = STRING_AGG(CAST({column} AS NVARCHAR(MAX)), '') WITHIN GROUP (ORDER BY rn)"
        );

        let mut script = plan.pre_select.clone();
        script.push("DECLARE @columns NVARCHAR(MAX);".to_string());
        script.push(format!("{};", plan.census_with(&d, &collect)));
        script.push(format!(
            "DECLARE @sql NVARCHAR(MAX) = N{} + COALESCE(@columns, N'') + N{};",
            d.quote_literal(&plan.head),
            d.quote_literal(&plan.tail),
        ));
        // the axis bounds are variables of this batch, not of the dynamic one
        script.push(if axis_parameters {
            "EXECUTE sp_executesql @sql, N'@startDate DATE, @endDate DATE', @startDate = @startDate, @endDate = @endDate;"
                .to_string()
        } else {
            "EXECUTE sp_executesql @sql;".to_string()
        });
        script.join("\n")
    }
}

impl AggregateSynthesizer for SqlServerAggregates {
    fn dialect(&self) -> &dyn Dialect {
        &SqlServerDialect
    }

    fn axis_alias(&self) -> &str {
        &self.axis_alias
    }

    fn date_axis(&self, axis: &AxisSpec) -> DateAxis {
        let unit = dateadd_unit(axis.increment);
        let body = format!(
            "SELECT @startDate AS dt\nUNION ALL\nSELECT DATEADD({unit}, 1, dt) FROM {AXIS_CTE}\nWHERE DATEADD({unit}, 1, dt) <= @endDate"
        );
        DateAxis {
            settings: vec![
                format!("DECLARE @startDate DATE = {};", axis.start_date),
                format!("DECLARE @endDate DATE = {};", axis.end_date),
            ],
            cte: Cte::recursive(AXIS_CTE, body),
            options: vec![format!("OPTION (MAXRECURSION {})", self.max_recursion)],
        }
    }

    fn build_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let plan = plan_pivot(&SqlServerDialect, request)?;
        Ok(self.pivot_script(&plan, false))
    }

    fn build_axis_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let spec = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
            shape: Shape::AxisPivot,
            field: "Axis",
        })?;
        let date_axis = self.date_axis(spec);
        let plan = plan_axis_pivot(&SqlServerDialect, &date_axis, &self.axis_alias, request)?;
        Ok(self.pivot_script(&plan, true))
    }
}
