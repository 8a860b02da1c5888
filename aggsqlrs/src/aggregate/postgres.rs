//! PostgreSQL aggregate synthesis.
//!
//! The calendar comes from `generate_series`. Pivot columns use
//! `FILTER (WHERE ...)` and are assembled inside a `DO` block with
//! `format('%L')`/`format('%I')` quoting; the block materialises the result
//! as a temporary view that the script selects from afterwards.

use crate::config::AggsqlConfig;
use crate::dialect::postgres::series_interval;
use crate::dialect::{Dialect, PostgresDialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::Cte;

use super::axis::{DateAxis, AXIS_CTE};
use super::pivot::{plan_axis_pivot, plan_pivot, PivotPlan};
use super::{AggregateSynthesizer, Shape};

#[derive(Debug, Clone)]
pub struct PostgresAggregates {
    axis_alias: String,
    pivot_view: String,
}

impl Default for PostgresAggregates {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl PostgresAggregates {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            axis_alias: config.defaults.axis_alias.clone(),
            pivot_view: config.postgres.pivot_view.clone(),
        }
    }

    fn pivot_script(&self, plan: &PivotPlan) -> String {
        let d = PostgresDialect;
        let view = d.quote_ident(&self.pivot_view);
        let column = format!(
            "format('%s%L%s%I', {}, piv, {}, piv)",
            d.quote_literal(&plan.column.prefix),
            d.quote_literal(&plan.column.infix),
        );
        let collect = format!("SELECT string_agg({column}, '' ORDER BY rn) INTO pivot_columns");

        let mut script = plan.pre_select.clone();
        script.push("DO $aggsql$".to_string());
        script.push("DECLARE".to_string());
        script.push("pivot_columns TEXT;".to_string());
        script.push("BEGIN".to_string());
        script.push(format!("{};", plan.census_with(&d, &collect)));
        script.push(format!(
            "EXECUTE {};",
            d.quote_literal(&format!("DROP VIEW IF EXISTS {view}"))
        ));
        script.push(format!(
            "EXECUTE {} || coalesce(pivot_columns, '') || {};",
            d.quote_literal(&format!("CREATE TEMP VIEW {view} AS\n{}", plan.head)),
            d.quote_literal(&plan.tail),
        ));
        script.push("END".to_string());
        script.push("$aggsql$;".to_string());
        script.push(format!("SELECT * FROM {view};"));
        script.join("\n")
    }
}

impl AggregateSynthesizer for PostgresAggregates {
    fn dialect(&self) -> &dyn Dialect {
        &PostgresDialect
    }

    fn axis_alias(&self) -> &str {
        &self.axis_alias
    }

    fn date_axis(&self, axis: &AxisSpec) -> DateAxis {
        let body = format!(
            "SELECT CAST(g.dt AS DATE) AS dt\nFROM generate_series(CAST({} AS DATE), CAST({} AS DATE), INTERVAL '{}') AS g(dt)",
            axis.start_date,
            axis.end_date,
            series_interval(axis.increment)
        );
        DateAxis::new(Cte::new(AXIS_CTE, body))
    }

    fn build_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let plan = plan_pivot(&PostgresDialect, request)?;
        Ok(self.pivot_script(&plan))
    }

    fn build_axis_pivot(&self, request: &AggregateRequest) -> Result<String> {
        let spec = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
            shape: Shape::AxisPivot,
            field: "Axis",
        })?;
        let date_axis = self.date_axis(spec);
        let plan = plan_axis_pivot(&PostgresDialect, &date_axis, &self.axis_alias, request)?;
        Ok(self.pivot_script(&plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AxisIncrement;

    #[test]
    fn date_axis_is_a_plain_series() {
        let axis = PostgresAggregates::default()
            .date_axis(&AxisSpec::new("'2001-01-01'", "'2010-01-01'", AxisIncrement::Quarter));
        assert!(!axis.cte.recursive);
        assert!(axis.settings.is_empty());
        assert!(axis.cte.body.contains("INTERVAL '3 months'"));
    }
}
