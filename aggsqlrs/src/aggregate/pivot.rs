//! Dynamic pivot pieces shared by the dialect synthesizers.
//!
//! A pivot script has two phases. The census query (`pivotValues`) ranks the
//! distinct pivot values; the dialect folds them into one string of
//! generated columns, each built from a [`ColumnTemplate`]; that string is
//! spliced between the `head` and `tail` of the final statement, which is
//! then executed dynamically.

use crate::dialect::Dialect;
use crate::error::{AggsqlError, Result};
use crate::lines::{Line, Role, Slot};
use crate::models::AggregateRequest;
use crate::sql_ast::{Cte, SelectQuery, SqlRenderer};

use super::axis::{plan_axis, DateAxis};
use super::Shape;

/// Name of the census CTE; columns are `piv` (value as text) and `rn` (rank).
pub const CENSUS_CTE: &str = "pivotValues";

/// One generated column is `prefix || literal(piv) || infix || ident(piv)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTemplate {
    pub prefix: String,
    pub infix: String,
}

impl ColumnTemplate {
    /// Conditional aggregation of the count select over rows matching one
    /// pivot value.
    fn for_rows(dialect: &dyn Dialect, pivot_expr: &str, count: &Line) -> Result<Self> {
        let count_expr = count.text_without_alias();
        if dialect.supports_filtered_aggregates() {
            return Ok(Self {
                prefix: format!(", {count_expr} FILTER (WHERE {pivot_expr} = "),
                infix: ") AS ".to_string(),
            });
        }

        let (func, arg) = dialect.split_outermost_function(count_expr).ok_or_else(|| {
            AggsqlError::InvalidRequest(format!(
                "count select '{}' must be a single aggregate call to be pivoted",
                count.text
            ))
        })?;
        let (distinct, arg) = match strip_distinct(&arg) {
            Some(inner) => ("DISTINCT ", inner.to_string()),
            None => ("", arg),
        };
        let arg = if arg == "*" { "1".to_string() } else { arg };
        Ok(Self {
            prefix: format!(", {func}({distinct}CASE WHEN {pivot_expr} = "),
            infix: format!(" THEN {arg} ELSE NULL END) AS "),
        })
    }

    /// Reads the pre-aggregated count of one pivot value out of the dataset.
    fn for_dataset(dialect: &dyn Dialect, pivot_alias: &str, count_alias: &str) -> Self {
        let piv = format!("dataset.{}", dialect.quote_ident(pivot_alias));
        let count = format!("dataset.{}", dialect.quote_ident(count_alias));
        if dialect.supports_filtered_aggregates() {
            Self {
                prefix: format!(", MAX({count}) FILTER (WHERE {piv} = "),
                infix: ") AS ".to_string(),
            }
        } else {
            Self {
                prefix: format!(", MAX(CASE WHEN {piv} = "),
                infix: format!(" THEN {count} ELSE NULL END) AS "),
            }
        }
    }
}

fn strip_distinct(arg: &str) -> Option<&str> {
    let head = arg.get(..9)?;
    if head.eq_ignore_ascii_case("DISTINCT ") {
        Some(arg[9..].trim_start())
    } else {
        None
    }
}

/// A pivot script before dialect-specific execution plumbing is added.
#[derive(Debug, Clone)]
pub struct PivotPlan {
    /// Statements to run first: axis settings, then the caller's pre-select lines.
    pub pre_select: Vec<String>,
    pub census: Cte,
    pub column: ColumnTemplate,
    /// Final statement up to and including its fixed select list.
    pub head: String,
    /// Final statement from FROM onwards.
    pub tail: String,
}

/// Census of pivot values: distinct, non-null, ranked, optionally capped.
///
/// Restricted by the request's FROM and WHERE only. The rank orders by the
/// TopX ordering lines when given, else by the count descending with the
/// pivot value as tie-break. The cap is applied to the census query itself,
/// never inside `OVER (...)`.
fn census(
    dialect: &dyn Dialect,
    request: &AggregateRequest,
    shape: Shape,
    pivot_expr: &str,
    axis_guard: Option<&str>,
) -> Result<Cte> {
    let count = request.count_select().ok_or(AggsqlError::MissingSelect {
        shape,
        field: "CountSelect",
    })?;
    let limit = request.top_x_limit()?;

    let mut order: Vec<String> = request.top_x_order_by().map(|l| l.text.clone()).collect();
    if order.is_empty() {
        order = vec![
            format!("{} DESC", count.text_without_alias()),
            format!("{pivot_expr} ASC"),
        ];
    }
    let order = order.join(", ");

    let mut filters: Vec<String> = request
        .lines_in(Slot::Where)
        .filter(|l| l.role != Role::Axis)
        .map(|l| l.text.clone())
        .collect();
    filters.push(format!("{pivot_expr} IS NOT NULL"));
    if let Some(axis_expr) = axis_guard {
        filters.push(format!("{axis_expr} IS NOT NULL"));
    }

    let query = SelectQuery {
        select: vec![
            format!("{} AS piv", dialect.cast_to_text(pivot_expr)),
            format!("ROW_NUMBER() OVER (ORDER BY {order}) AS rn"),
        ],
        from: request.lines_in(Slot::From).map(|l| l.text.clone()).collect(),
        filters,
        group_by: vec![pivot_expr.to_string()],
        order_by: if limit.is_some() { vec![order] } else { Vec::new() },
        limit,
        ..SelectQuery::default()
    };
    Ok(Cte::new(CENSUS_CTE, SqlRenderer::new(dialect).render_select(&query)))
}

/// Pivot shape: one row per row-header value, one column per pivot value.
pub fn plan_pivot(dialect: &dyn Dialect, request: &AggregateRequest) -> Result<PivotPlan> {
    let missing = |field| AggsqlError::MissingSelect {
        shape: Shape::Pivot,
        field,
    };
    let pivot = request.pivot_select().ok_or(missing("PivotSelect"))?;
    let count = request.count_select().ok_or(missing("CountSelect"))?;
    let header = request
        .lines_in(Slot::Select)
        .find(|l| l.role == Role::None)
        .ok_or_else(|| {
            AggsqlError::InvalidRequest("Pivot shape needs a row header select".to_string())
        })?;
    let pivot_expr = pivot.text_without_alias();

    let mut group_by: Vec<String> = request
        .lines_in(Slot::GroupBy)
        .filter(|l| l.role != Role::Pivot && l.text.trim() != pivot_expr)
        .map(|l| l.text.clone())
        .collect();
    if group_by.is_empty() {
        group_by.push(header.text_without_alias().to_string());
    }

    let query = SelectQuery {
        select: vec![header.text.clone()],
        from: request.lines_in(Slot::From).map(|l| l.text.clone()).collect(),
        filters: request.lines_in(Slot::Where).map(|l| l.text.clone()).collect(),
        group_by,
        having: request.lines_in(Slot::Having).map(|l| l.text.clone()).collect(),
        order_by: request
            .lines_in(Slot::OrderBy)
            .filter(|l| l.role != Role::TopX)
            .map(|l| l.text.clone())
            .collect(),
        postfix: request
            .lines_in(Slot::Postfix)
            .filter(|l| l.role != Role::TopX)
            .map(|l| l.text.clone())
            .collect(),
        ..SelectQuery::default()
    };
    let (head, tail) = SqlRenderer::new(dialect).render_parts(&query);

    Ok(PivotPlan {
        pre_select: request
            .lines_in(Slot::PreSelect)
            .map(|l| l.text.clone())
            .collect(),
        census: census(dialect, request, Shape::Pivot, pivot_expr, None)?,
        column: ColumnTemplate::for_rows(dialect, pivot_expr, count)?,
        head,
        tail,
    })
}

/// AxisPivot shape: one row per axis bucket, one column per pivot value.
pub fn plan_axis_pivot(
    dialect: &dyn Dialect,
    date_axis: &DateAxis,
    axis_alias: &str,
    request: &AggregateRequest,
) -> Result<PivotPlan> {
    let missing = |field| AggsqlError::MissingSelect {
        shape: Shape::AxisPivot,
        field,
    };
    let pivot = request.pivot_select().ok_or(missing("PivotSelect"))?;
    let axis = plan_axis(dialect, request, Shape::AxisPivot)?;
    let pivot_alias = axis.aliases.pivot.as_deref().ok_or(missing("PivotSelect"))?;

    let mut statement = axis.statement(dialect, date_axis, axis_alias, Vec::new(), true);
    let pre_select = std::mem::take(&mut statement.pre_select);
    let (head, tail) = SqlRenderer::new(dialect).render_parts(&statement);

    Ok(PivotPlan {
        pre_select,
        census: census(
            dialect,
            request,
            Shape::AxisPivot,
            pivot.text_without_alias(),
            Some(&axis.axis_expr),
        )?,
        column: ColumnTemplate::for_dataset(dialect, pivot_alias, &axis.aliases.count),
        head,
        tail,
    })
}

impl PivotPlan {
    /// The census CTE followed by `select_list FROM pivotValues`, ready for a
    /// dialect to prepend its assignment syntax.
    pub fn census_with(&self, dialect: &dyn Dialect, select_list: &str) -> String {
        let renderer = SqlRenderer::new(dialect);
        format!(
            "{}\n{select_list}\nFROM {CENSUS_CTE}",
            renderer.render_with(std::slice::from_ref(&self.census))
        )
    }
}
