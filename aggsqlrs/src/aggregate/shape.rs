use std::fmt;

use serde::Serialize;

use crate::error::{AggsqlError, Result};
use crate::lines::{Role, Slot};
use crate::models::AggregateRequest;

/// The four aggregate statement structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    Plain,
    Axis,
    Pivot,
    AxisPivot,
}

impl Shape {
    /// Pick the shape from which distinguished selects are present.
    pub fn classify(request: &AggregateRequest) -> Shape {
        match (request.axis_select().is_some(), request.pivot_select().is_some()) {
            (false, false) => Shape::Plain,
            (true, false) => Shape::Axis,
            (false, true) => Shape::Pivot,
            (true, true) => Shape::AxisPivot,
        }
    }

    pub fn uses_axis(&self) -> bool {
        matches!(self, Shape::Axis | Shape::AxisPivot)
    }

    pub fn uses_pivot(&self) -> bool {
        matches!(self, Shape::Pivot | Shape::AxisPivot)
    }

    /// Fail with the first field this shape needs that the request lacks.
    pub fn check_requirements(&self, request: &AggregateRequest) -> Result<()> {
        let missing = |field: &'static str| AggsqlError::MissingSelect {
            shape: *self,
            field,
        };

        if self.uses_axis() {
            if request.axis.is_none() {
                return Err(missing("Axis"));
            }
            if request.axis_select().is_none() {
                return Err(missing("AxisSelect"));
            }
        }
        if self.uses_pivot() && request.pivot_select().is_none() {
            return Err(missing("PivotSelect"));
        }
        if *self != Shape::Plain && request.count_select().is_none() {
            return Err(missing("CountSelect"));
        }

        if *self == Shape::Pivot {
            let headers = request
                .lines_in(Slot::Select)
                .filter(|l| l.role == Role::None)
                .count();
            if headers != 1 {
                return Err(AggsqlError::InvalidRequest(format!(
                    "Pivot shape needs exactly one row header select besides the pivot and count selects, found {headers}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Plain => "Plain",
            Shape::Axis => "Axis",
            Shape::Pivot => "Pivot",
            Shape::AxisPivot => "AxisPivot",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::Line;
    use crate::models::{AxisIncrement, AxisSpec};

    fn with_roles(axis: bool, pivot: bool) -> AggregateRequest {
        let mut lines = vec![Line::select("COUNT(*) AS n").with_role(Role::CountFunction)];
        if axis {
            lines.push(Line::select("EventDate").with_role(Role::Axis));
        }
        if pivot {
            lines.push(Line::select("Category").with_role(Role::Pivot));
        }
        AggregateRequest::new(lines)
    }

    #[test]
    fn classification_covers_all_four_combinations() {
        assert_eq!(Shape::classify(&with_roles(false, false)), Shape::Plain);
        assert_eq!(Shape::classify(&with_roles(true, false)), Shape::Axis);
        assert_eq!(Shape::classify(&with_roles(false, true)), Shape::Pivot);
        assert_eq!(Shape::classify(&with_roles(true, true)), Shape::AxisPivot);
    }

    #[test]
    fn missing_count_select_names_field_and_shape() {
        let req = AggregateRequest::new(vec![
            Line::select("EventDate").with_role(Role::Axis),
            Line::group_by("EventDate").with_role(Role::Axis),
        ])
        .with_axis(AxisSpec::new("'2001-01-01'", "'2002-01-01'", AxisIncrement::Year));
        let err = Shape::Axis.check_requirements(&req).unwrap_err();
        assert_eq!(err.to_string(), "Axis shape requires CountSelect to be non-null");
    }

    #[test]
    fn axis_shape_without_spec_is_reported() {
        let err = Shape::AxisPivot
            .check_requirements(&with_roles(true, true))
            .unwrap_err();
        assert!(matches!(
            err,
            AggsqlError::MissingSelect { shape: Shape::AxisPivot, field: "Axis" }
        ));
    }

    #[test]
    fn pivot_requires_single_row_header() {
        let err = Shape::Pivot
            .check_requirements(&with_roles(false, true))
            .unwrap_err();
        assert!(err.to_string().contains("exactly one row header"));

        let mut req = with_roles(false, true);
        req.lines.push(Line::select("Region"));
        assert!(Shape::Pivot.check_requirements(&req).is_ok());
    }
}
