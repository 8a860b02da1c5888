//! SQLite aggregate synthesis.
//!
//! SQLite has no way to run a statement built at execution time, so only the
//! Plain and Axis shapes are available.

use crate::config::AggsqlConfig;
use crate::dialect::sqlite::date_modifier;
use crate::dialect::{DatabaseType, Dialect, SqliteDialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::Cte;

use super::axis::{DateAxis, AXIS_CTE};
use super::{AggregateSynthesizer, Shape};

#[derive(Debug, Clone)]
pub struct SqliteAggregates {
    axis_alias: String,
}

impl Default for SqliteAggregates {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl SqliteAggregates {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            axis_alias: config.defaults.axis_alias.clone(),
        }
    }
}

impl AggregateSynthesizer for SqliteAggregates {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn axis_alias(&self) -> &str {
        &self.axis_alias
    }

    fn date_axis(&self, axis: &AxisSpec) -> DateAxis {
        let step = format!("date(dt, '{}')", date_modifier(axis.increment));
        let body = format!(
            "SELECT date({})\nUNION ALL\nSELECT {step} FROM {AXIS_CTE}\nWHERE {step} <= date({})",
            axis.start_date, axis.end_date
        );
        DateAxis::new(Cte::recursive(AXIS_CTE, body).with_columns(&["dt"]))
    }

    fn build_pivot(&self, _request: &AggregateRequest) -> Result<String> {
        Err(AggsqlError::UnsupportedShape {
            dialect: DatabaseType::Sqlite,
            shape: Shape::Pivot,
        })
    }

    fn build_axis_pivot(&self, _request: &AggregateRequest) -> Result<String> {
        Err(AggsqlError::UnsupportedShape {
            dialect: DatabaseType::Sqlite,
            shape: Shape::AxisPivot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AxisIncrement;

    #[test]
    fn date_axis_steps_with_modifier() {
        let axis = SqliteAggregates::default()
            .date_axis(&AxisSpec::new("'2001-01-01'", "'2001-12-31'", AxisIncrement::Month));
        assert!(axis.cte.body.contains("SELECT date(dt, '+1 month') FROM dateAxis"));
        assert!(axis.cte.body.ends_with("<= date('2001-12-31')"));
    }
}
