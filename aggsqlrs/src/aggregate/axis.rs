//! Date axis binning shared by the Axis and AxisPivot shapes.

use crate::dialect::Dialect;
use crate::error::{AggsqlError, Result};
use crate::lines::{Role, Slot};
use crate::models::{AggregateRequest, AxisIncrement};
use crate::sql_ast::{Cte, SelectQuery, SqlRenderer};

use super::Shape;

/// Name of the generated calendar CTE; its single column is `dt`.
pub const AXIS_CTE: &str = "dateAxis";

/// A dialect's calendar generator: the CTE itself plus any statements that
/// must run before it and options that must follow the outer query.
#[derive(Debug, Clone)]
pub struct DateAxis {
    pub settings: Vec<String>,
    pub cte: Cte,
    pub options: Vec<String>,
}

impl DateAxis {
    pub fn new(cte: Cte) -> Self {
        Self {
            settings: Vec::new(),
            cte,
            options: Vec::new(),
        }
    }
}

/// Column names the outer statement reads from the dataset. The dataset
/// re-aliases each of these columns with the quoted name, so both sides
/// agree on case in dialects that fold unquoted identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetAliases {
    pub join: String,
    pub count: String,
    pub pivot: Option<String>,
}

impl DatasetAliases {
    pub fn resolve(dialect: &dyn Dialect, request: &AggregateRequest, shape: Shape) -> Result<Self> {
        let axis_select = request.axis_select().ok_or(AggsqlError::MissingSelect {
            shape,
            field: "AxisSelect",
        })?;
        let count_select = request.count_select().ok_or(AggsqlError::MissingSelect {
            shape,
            field: "CountSelect",
        })?;
        Ok(Self {
            join: dialect.runtime_name(&axis_select.text)?,
            count: dialect.runtime_name(&count_select.text)?,
            pivot: request
                .pivot_select()
                .map(|l| dialect.runtime_name(&l.text))
                .transpose()?,
        })
    }
}

/// Everything the outer axis statement needs, derived once per request.
#[derive(Debug, Clone)]
pub struct AxisPlan {
    /// Axis select without alias or binning, as the caller wrote it.
    pub axis_expr: String,
    pub aliases: DatasetAliases,
    /// `datePart(axis.dt)`.
    pub bucket: String,
    /// The caller's query from SELECT through HAVING with the axis columns binned.
    pub dataset: String,
    /// Caller lines that frame the outer statement.
    pub pre_select: Vec<String>,
    pub postfix: Vec<String>,
}

pub fn plan_axis(dialect: &dyn Dialect, request: &AggregateRequest, shape: Shape) -> Result<AxisPlan> {
    let axis = request.axis.as_ref().ok_or(AggsqlError::MissingSelect {
        shape,
        field: "Axis",
    })?;
    let axis_select = request.axis_select().ok_or(AggsqlError::MissingSelect {
        shape,
        field: "AxisSelect",
    })?;

    let aliases = DatasetAliases::resolve(dialect, request, shape)?;
    let binned = bin_axis_lines(dialect, request, axis.increment, &aliases);

    let inner = SelectQuery::from_lines(
        binned
            .lines_between(Slot::Select, Slot::Having)
            .filter(|l| l.role != Role::TopX),
    );
    let dataset = SqlRenderer::new(dialect).render_select(&inner);

    Ok(AxisPlan {
        axis_expr: axis_select.text_without_alias().to_string(),
        aliases,
        bucket: dialect.date_part_of_column(axis.increment, "axis.dt"),
        dataset,
        pre_select: request
            .lines_in(Slot::PreSelect)
            .map(|l| l.text.clone())
            .collect(),
        postfix: request
            .lines_in(Slot::Postfix)
            .filter(|l| l.role != Role::TopX)
            .map(|l| l.text.clone())
            .collect(),
    })
}

/// A copy of the request whose axis select and axis group-by are wrapped in
/// the increment's date part, so data rows bin exactly like axis rows. The
/// axis, count and pivot selects are aliased with their quoted names.
pub fn bin_axis_lines(
    dialect: &dyn Dialect,
    request: &AggregateRequest,
    increment: AxisIncrement,
    aliases: &DatasetAliases,
) -> AggregateRequest {
    let aliased = |expr: &str, alias: &str| format!("{expr} AS {}", dialect.quote_ident(alias));
    request.map_lines(|line| match (line.slot, line.role) {
        (Slot::Select, Role::Axis) => {
            let binned = dialect.date_part_of_column(increment, line.text_without_alias());
            line.with_text(aliased(&binned, &aliases.join))
        }
        (Slot::GroupBy, Role::Axis) => {
            line.with_text(dialect.date_part_of_column(increment, line.text_without_alias()))
        }
        (Slot::Select, Role::CountFunction) => {
            line.with_text(aliased(line.text_without_alias(), &aliases.count))
        }
        (Slot::Select, Role::Pivot) => match &aliases.pivot {
            Some(alias) => line.with_text(aliased(line.text_without_alias(), alias)),
            None => line.clone(),
        },
        _ => line.clone(),
    })
}

impl AxisPlan {
    /// Outer statement: every axis bucket left-joined to the dataset.
    ///
    /// `columns` follow the bucket column. With `grouped` the statement
    /// groups by bucket, which generated pivot columns need.
    pub fn statement(
        &self,
        dialect: &dyn Dialect,
        date_axis: &DateAxis,
        axis_alias: &str,
        columns: Vec<String>,
        grouped: bool,
    ) -> SelectQuery {
        let mut select = vec![format!("{} AS {axis_alias}", self.bucket)];
        select.extend(columns);

        SelectQuery {
            pre_select: date_axis
                .settings
                .iter()
                .chain(self.pre_select.iter())
                .cloned()
                .collect(),
            with: vec![date_axis.cte.clone()],
            select,
            from: vec![
                format!("{AXIS_CTE} axis"),
                format!(
                    "LEFT JOIN (\n{}\n) dataset ON dataset.{} = {}",
                    self.dataset,
                    dialect.quote_ident(&self.aliases.join),
                    self.bucket
                ),
            ],
            group_by: if grouped { vec![self.bucket.clone()] } else { Vec::new() },
            order_by: vec![self.bucket.clone()],
            postfix: self
                .postfix
                .iter()
                .chain(date_axis.options.iter())
                .cloned()
                .collect(),
            ..SelectQuery::default()
        }
    }

    /// The count column read from the dataset.
    pub fn count_column(&self, dialect: &dyn Dialect) -> String {
        format!("dataset.{}", dialect.quote_ident(&self.aliases.count))
    }
}

/// Axis shape for any dialect that can generate a calendar.
pub fn build_axis(
    dialect: &dyn Dialect,
    date_axis: &DateAxis,
    axis_alias: &str,
    request: &AggregateRequest,
) -> Result<String> {
    let ignored = request.lines.iter().filter(|l| l.role == Role::TopX).count();
    if ignored > 0 {
        tracing::debug!(lines = ignored, "TopX lines do not apply to a dense date axis");
    }
    let plan = plan_axis(dialect, request, Shape::Axis)?;
    let count = plan.count_column(dialect);
    let query = plan.statement(dialect, date_axis, axis_alias, vec![count], false);
    Ok(SqlRenderer::new(dialect).render_select(&query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};
    use crate::lines::Line;
    use crate::models::AxisSpec;

    fn request(axis_select: &str) -> AggregateRequest {
        AggregateRequest::new(vec![
            Line::select("COUNT(*) AS MyCount").with_role(Role::CountFunction),
            Line::select(axis_select).with_role(Role::Axis),
            Line::table("events"),
            Line::group_by("EventDate").with_role(Role::Axis),
        ])
        .with_axis(AxisSpec::new("'2001-01-01'", "'2010-01-01'", AxisIncrement::Year))
    }

    #[test]
    fn binning_leaves_request_untouched() {
        let req = request("EventDate");
        let aliases = DatasetAliases::resolve(&MySqlDialect, &req, Shape::Axis).unwrap();
        let binned = bin_axis_lines(&MySqlDialect, &req, AxisIncrement::Year, &aliases);
        assert_eq!(binned.axis_select().unwrap().text, "YEAR(EventDate) AS `EventDate`");
        assert_eq!(binned.axis_group_by().unwrap().text, "YEAR(EventDate)");
        assert_eq!(binned.count_select().unwrap().text, "COUNT(*) AS `MyCount`");
        assert_eq!(req.axis_select().unwrap().text, "EventDate");
        assert_eq!(req.count_select().unwrap().text, "COUNT(*) AS MyCount");
    }

    #[test]
    fn dataset_columns_use_the_names_the_outer_query_reads() {
        let mut req = request("EventDate");
        req.lines.push(Line::select("t.Category").with_role(Role::Pivot));
        let plan = plan_axis(&PostgresDialect, &req, Shape::AxisPivot).unwrap();
        assert_eq!(plan.aliases.pivot.as_deref(), Some("Category"));
        assert!(plan
            .dataset
            .starts_with("SELECT COUNT(*) AS \"MyCount\", CAST(date_part('year', EventDate) AS INTEGER) AS \"EventDate\", t.Category AS \"Category\""));
        assert_eq!(plan.count_column(&PostgresDialect), "dataset.\"MyCount\"");
    }

    #[test]
    fn join_alias_prefers_explicit_alias() {
        let plan = plan_axis(&MySqlDialect, &request("e.EventDate AS evt"), Shape::Axis).unwrap();
        assert_eq!(plan.aliases.join, "evt");
        assert_eq!(plan.axis_expr, "e.EventDate");
        assert!(plan.dataset.contains("YEAR(e.EventDate) AS `evt`"));
    }

    #[test]
    fn computed_axis_without_alias_is_ambiguous() {
        let err = plan_axis(&MySqlDialect, &request("DATE(EventDate)"), Shape::Axis).unwrap_err();
        assert!(matches!(err, AggsqlError::AmbiguousAlias(ref s) if s == "DATE(EventDate)"));
    }
}
