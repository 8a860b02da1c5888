//! MySQL aggregate synthesis.
//!
//! Needs MySQL 8 (recursive CTEs and window functions). Pivot columns are
//! ranked with `ROW_NUMBER()` in the census, folded with `GROUP_CONCAT` into
//! a user variable, and the final statement is run with `PREPARE`/`EXECUTE`.

use crate::config::AggsqlConfig;
use crate::dialect::mysql::interval_unit;
use crate::dialect::{Dialect, MySqlDialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::Cte;

use super::axis::{DateAxis, AXIS_CTE};
use super::pivot::{plan_axis_pivot, plan_pivot, PivotPlan};
use super::{AggregateSynthesizer, Shape};

#[derive(Debug, Clone)]
pub struct MySqlAggregates {
    axis_alias: String,
    cte_max_recursion_depth: u64,
    group_concat_max_len: u64,
}

impl Default for MySqlAggregates {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl MySqlAggregates {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            axis_alias: config.defaults.axis_alias.clone(),
            cte_max_recursion_depth: config.mysql.cte_max_recursion_depth,
            group_concat_max_len: config.mysql.group_concat_max_len,
        }
    }

    fn pivot_script(&self, plan: &PivotPlan, variable: &str) -> String {
        let d = MySqlDialect;
        let column = format!(
            "CONCAT({}, QUOTE(piv), {}, '`', REPLACE(piv, '`', '``'), '`')",
            d.quote_literal(&plan.column.prefix),
            d.quote_literal(&plan.column.infix),
        );
        let collect =
            format!("SELECT GROUP_CONCAT({column} ORDER BY rn SEPARATOR '') INTO {variable}");

        let mut script = vec![format!(
            "SET SESSION group_concat_max_len = {};",
            self.group_concat_max_len
        )];
        script.extend(plan.pre_select.iter().cloned());
        script.push(format!("SET {variable} = NULL;"));
        script.push(format!("{};", plan.census_with(&d, &collect)));
        script.push(format!(
            "SET @sql = CONCAT({}, IFNULL({variable}, ''), {});",
            d.quote_literal(&plan.head),
            d.quote_literal(&plan.tail),
        ));
        script.push("PREPARE stmt FROM @sql;".to_string());
        script.push("EXECUTE stmt;".to_string());
        script.push("DEALLOCATE PREPARE stmt;".to_string());
        script.join("\n")
    }
}

impl AggregateSynthesizer for MySqlAggregates {
    fn dialect(&self) -> &dyn Dialect {
        &MySqlDialect
    }

    fn axis_alias(&self) -> &str {
        &self.axis_alias
    }

    fn date_axis(&self, axis: &AxisSpec) -> DateAxis {
        let unit = interval_unit(axis.increment);
        let body = format!(
            "SELECT CAST({} AS DATE) AS dt\nUNION ALL\nSELECT DATE_ADD(dt, INTERVAL 1 {unit}) FROM {AXIS_CTE}\nWHERE DATE_ADD(dt, INTERVAL 1 {unit}) <= CAST({} AS DATE)",
            axis.start_date, axis.end_date
        );
        DateAxis {
            settings: vec![format!(
                "SET SESSION cte_max_recursion_depth = {};",
                self.cte_max_recursion_depth
            )],
            cte: Cte::recursive(AXIS_CTE, body),
            options: Vec::new(),
        }
    }

    fn build_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let plan = plan_pivot(&MySqlDialect, request)?;
        Ok(self.pivot_script(&plan, "@columnsSelectCases"))
    }

    fn build_axis_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let spec = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
            shape: Shape::AxisPivot,
            field: "Axis",
        })?;
        let date_axis = self.date_axis(spec);
        let plan = plan_axis_pivot(&MySqlDialect, &date_axis, &self.axis_alias, request)?;
        Ok(self.pivot_script(&plan, "@columnsSelectFromDataset"))
    }
}
