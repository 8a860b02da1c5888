//! Aggregate query synthesis.
//!
//! [`AggregateSynthesizer::build`] validates a request, classifies it into a
//! [`Shape`] and hands it to the dialect's method for that shape. Each
//! synthesizer is constructed once (usually through [`AggregateBuilder`])
//! and is immutable afterwards, so it can be shared across threads.

use crate::config::AggsqlConfig;
use crate::dialect::{DatabaseType, Dialect};
use crate::error::{AggsqlError, Result};
use crate::models::{AggregateRequest, AxisSpec};
use crate::sql_ast::{SelectQuery, SqlRenderer};
use crate::validation::validate_request;

pub mod axis;
mod mysql;
mod oracle;
pub mod pivot;
mod postgres;
mod shape;
mod sqlite;
mod sqlserver;

pub use axis::DateAxis;
pub use mysql::MySqlAggregates;
pub use oracle::OracleAggregates;
pub use postgres::PostgresAggregates;
pub use shape::Shape;
pub use sqlite::SqliteAggregates;
pub use sqlserver::SqlServerAggregates;

pub trait AggregateSynthesizer: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Column alias of the axis bucket.
    fn axis_alias(&self) -> &str;

    /// Calendar of every bucket from `axis.start_date` to `axis.end_date`.
    fn date_axis(&self, axis: &AxisSpec) -> DateAxis;

    fn build_plain(&self, request: &AggregateRequest) -> Result<String> {
        let mut query = SelectQuery::from_lines(&request.lines);
        query.limit = request.top_x_limit()?;
        Ok(SqlRenderer::new(self.dialect()).render_select(&query))
    }

    fn build_axis(&self, request: &AggregateRequest) -> Result<String> {
        let spec = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
            shape: Shape::Axis,
            field: "Axis",
        })?;
        axis::build_axis(self.dialect(), &self.date_axis(spec), self.axis_alias(), request)
    }

    fn build_pivot(&self, request: &AggregateRequest) -> Result<String>;

    fn build_axis_pivot(&self, request: &AggregateRequest) -> Result<String>;

    /// Synthesize the statement (or script) for `request`.
    ///
    /// Every contract check runs before any SQL text is produced.
    fn build(&self, request: &AggregateRequest) -> Result<String> {
        validate_request(request)?;
        let shape = Shape::classify(request);
        shape.check_requirements(request)?;

        let dialect = self.dialect().database_type();
        tracing::debug!(%shape, %dialect, lines = request.lines.len(), "synthesizing aggregate");

        let sql = match shape {
            Shape::Plain => self.build_plain(request)?,
            Shape::Axis => self.build_axis(request)?,
            Shape::Pivot => self.build_pivot(request)?,
            Shape::AxisPivot => self.build_axis_pivot(request)?,
        };
        tracing::trace!(%shape, sql = %sql, "synthesized aggregate");
        Ok(sql)
    }
}

/// One synthesizer per database, built from a single configuration.
pub struct AggregateBuilder {
    sqlserver: SqlServerAggregates,
    mysql: MySqlAggregates,
    postgres: PostgresAggregates,
    oracle: OracleAggregates,
    sqlite: SqliteAggregates,
}

impl Default for AggregateBuilder {
    fn default() -> Self {
        Self::from_config(&AggsqlConfig::default())
    }
}

impl AggregateBuilder {
    pub fn from_config(config: &AggsqlConfig) -> Self {
        Self {
            sqlserver: SqlServerAggregates::from_config(config),
            mysql: MySqlAggregates::from_config(config),
            postgres: PostgresAggregates::from_config(config),
            oracle: OracleAggregates::from_config(config),
            sqlite: SqliteAggregates::from_config(config),
        }
    }

    pub fn synthesizer(&self, database: DatabaseType) -> &dyn AggregateSynthesizer {
        match database {
            DatabaseType::MicrosoftSqlServer => &self.sqlserver,
            DatabaseType::MySql => &self.mysql,
            DatabaseType::PostgreSql => &self.postgres,
            DatabaseType::Oracle => &self.oracle,
            DatabaseType::Sqlite => &self.sqlite,
        }
    }

    /// Build SQL for `request` in the syntax of `database`.
    pub fn build(&self, database: DatabaseType, request: &AggregateRequest) -> Result<String> {
        self.synthesizer(database).build(request)
    }
}
