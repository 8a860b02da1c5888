use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AggsqlError, Result};
use crate::expr_utils::trailing_count;
use crate::lines::{Line, Role, Slot};

/// Calendar bucket size of a date axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AxisIncrement {
    Day,
    Month,
    Quarter,
    Year,
}

impl AxisIncrement {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisIncrement::Day => "day",
            AxisIncrement::Month => "month",
            AxisIncrement::Quarter => "quarter",
            AxisIncrement::Year => "year",
        }
    }
}

impl FromStr for AxisIncrement {
    type Err = AggsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(AxisIncrement::Day),
            "month" => Ok(AxisIncrement::Month),
            "quarter" => Ok(AxisIncrement::Quarter),
            "year" => Ok(AxisIncrement::Year),
            _ => Err(AggsqlError::UnsupportedIncrement(s.to_string())),
        }
    }
}

impl TryFrom<String> for AxisIncrement {
    type Error = AggsqlError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AxisIncrement> for String {
    fn from(value: AxisIncrement) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AxisIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds and step of a date axis.
///
/// `start_date` and `end_date` are SQL expressions already written for the
/// target dialect (`'2001-01-01'`, `DATE '2001-01-01'`, `GETDATE()`); they
/// are interpolated, never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub start_date: String,
    pub end_date: String,
    pub increment: AxisIncrement,
}

impl AxisSpec {
    pub fn new(
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        increment: AxisIncrement,
    ) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            increment,
        }
    }
}

/// Everything needed to synthesize one aggregate statement.
///
/// The distinguished selects (axis, pivot, count) are found by role rather
/// than stored separately, so they can never disagree with `lines`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub lines: Vec<Line>,
    #[serde(default)]
    pub axis: Option<AxisSpec>,
}

impl AggregateRequest {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines, axis: None }
    }

    pub fn with_axis(mut self, axis: AxisSpec) -> Self {
        self.axis = Some(axis);
        self
    }

    fn find(&self, slot: Slot, role: Role) -> Option<&Line> {
        self.lines.iter().find(|l| l.is(slot, role))
    }

    pub fn axis_select(&self) -> Option<&Line> {
        self.find(Slot::Select, Role::Axis)
    }

    pub fn axis_group_by(&self) -> Option<&Line> {
        self.find(Slot::GroupBy, Role::Axis)
    }

    pub fn pivot_select(&self) -> Option<&Line> {
        self.find(Slot::Select, Role::Pivot)
    }

    pub fn count_select(&self) -> Option<&Line> {
        self.find(Slot::Select, Role::CountFunction)
    }

    /// Ordering used to rank TopX candidates.
    pub fn top_x_order_by(&self) -> impl Iterator<Item = &Line> {
        self.lines_in(Slot::OrderBy)
            .filter(|l| matches!(l.role, Role::TopX))
    }

    /// The line carrying the TopX row count, if any.
    pub fn top_x_line(&self) -> Option<&Line> {
        self.lines
            .iter()
            .find(|l| l.role == Role::TopX && matches!(l.slot, Slot::Select | Slot::Postfix))
    }

    /// Row count of the TopX cap.
    pub fn top_x_limit(&self) -> Result<Option<u64>> {
        match self.top_x_line() {
            None => Ok(None),
            Some(line) => match trailing_count(&line.text) {
                Some(n) if n > 0 => Ok(Some(n)),
                _ => Err(AggsqlError::InvalidTopX(line.text.clone())),
            },
        }
    }

    pub fn lines_in(&self, slot: Slot) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(move |l| l.slot == slot)
    }

    /// Lines whose slot lies in `from..=to`, in insertion order.
    pub fn lines_between(&self, from: Slot, to: Slot) -> impl Iterator<Item = &Line> {
        self.lines
            .iter()
            .filter(move |l| l.slot >= from && l.slot <= to)
    }

    /// A new request with `f` applied to every line.
    pub fn map_lines(&self, f: impl Fn(&Line) -> Line) -> Self {
        Self {
            lines: self.lines.iter().map(f).collect(),
            axis: self.axis.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AggregateRequest {
        AggregateRequest::new(vec![
            Line::select("COUNT(*) AS MyCount").with_role(Role::CountFunction),
            Line::select("EventDate").with_role(Role::Axis),
            Line::table("events"),
            Line::group_by("EventDate").with_role(Role::Axis),
            Line::order_by("COUNT(*) DESC").with_role(Role::TopX),
            Line::postfix("LIMIT 5").with_role(Role::TopX),
        ])
    }

    #[test]
    fn increment_parses_case_insensitively() {
        assert_eq!("Year".parse::<AxisIncrement>().unwrap(), AxisIncrement::Year);
        assert_eq!(" QUARTER ".parse::<AxisIncrement>().unwrap(), AxisIncrement::Quarter);
    }

    #[test]
    fn unknown_increment_is_rejected() {
        let err = "week".parse::<AxisIncrement>().unwrap_err();
        assert!(matches!(err, AggsqlError::UnsupportedIncrement(ref s) if s == "week"));
        assert!(serde_json::from_str::<AxisIncrement>("\"fortnight\"").is_err());
    }

    #[test]
    fn finds_distinguished_lines_by_role() {
        let req = request();
        assert_eq!(req.count_select().unwrap().text, "COUNT(*) AS MyCount");
        assert_eq!(req.axis_select().unwrap().text, "EventDate");
        assert_eq!(req.axis_group_by().unwrap().slot, Slot::GroupBy);
        assert!(req.pivot_select().is_none());
        assert_eq!(req.top_x_order_by().count(), 1);
        assert_eq!(req.top_x_limit().unwrap(), Some(5));
    }

    #[test]
    fn zero_top_x_is_invalid() {
        let req = AggregateRequest::new(vec![Line::postfix("TOP 0").with_role(Role::TopX)]);
        assert!(matches!(req.top_x_limit(), Err(AggsqlError::InvalidTopX(_))));
    }

    #[test]
    fn lines_between_keeps_insertion_order() {
        let req = AggregateRequest::new(vec![
            Line::group_by("a"),
            Line::select("x"),
            Line::group_by("b"),
            Line::having("COUNT(*) > 1"),
        ]);
        let texts: Vec<_> = req
            .lines_between(Slot::GroupBy, Slot::Having)
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b", "COUNT(*) > 1"]);
    }
}
