use crate::error::{AggsqlError, Result};
use crate::lines::{Role, Slot};
use crate::models::AggregateRequest;

/// Check the request's own contract: role multiplicity, role placement and
/// the axis spec / axis select pairing. Shape-specific requirements are
/// checked separately once the shape is known.
pub fn validate_request(request: &AggregateRequest) -> Result<()> {
    check_unique(request, Slot::Select, Role::Axis, "axis select")?;
    check_unique(request, Slot::GroupBy, Role::Axis, "axis group by")?;
    check_unique(request, Slot::Select, Role::Pivot, "pivot select")?;
    check_unique(request, Slot::Select, Role::CountFunction, "count select")?;

    let limits = request
        .lines
        .iter()
        .filter(|l| l.role == Role::TopX && matches!(l.slot, Slot::Select | Slot::Postfix))
        .count();
    if limits > 1 {
        return Err(AggsqlError::InvalidRequest(format!(
            "expected at most one TopX limit line, found {limits}"
        )));
    }

    for line in &request.lines {
        let placed = match line.role {
            Role::None => true,
            Role::CountFunction => line.slot == Slot::Select,
            Role::Pivot | Role::Axis => matches!(line.slot, Slot::Select | Slot::GroupBy),
            Role::TopX => matches!(line.slot, Slot::Select | Slot::OrderBy | Slot::Postfix),
        };
        if !placed {
            return Err(AggsqlError::InvalidRequest(format!(
                "line '{}' has role {:?} which cannot be used in the {:?} slot",
                line.text, line.role, line.slot
            )));
        }
    }

    match (request.axis.is_some(), request.axis_select().is_some()) {
        (true, false) => {
            return Err(AggsqlError::InvalidRequest(
                "an axis spec was given but no select line has the Axis role".to_string(),
            ))
        }
        (false, true) => {
            return Err(AggsqlError::InvalidRequest(
                "a select line has the Axis role but no axis spec was given".to_string(),
            ))
        }
        _ => {}
    }
    if request.axis_select().is_some() && request.axis_group_by().is_none() {
        return Err(AggsqlError::InvalidRequest(
            "the axis select needs a matching GroupBy line with the Axis role".to_string(),
        ));
    }

    request.top_x_limit()?;
    Ok(())
}

fn check_unique(request: &AggregateRequest, slot: Slot, role: Role, what: &str) -> Result<()> {
    let count = request.lines.iter().filter(|l| l.is(slot, role)).count();
    if count > 1 {
        return Err(AggsqlError::InvalidRequest(format!(
            "expected at most one {what} line, found {count}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::Line;
    use crate::models::{AxisIncrement, AxisSpec};

    fn axis() -> AxisSpec {
        AxisSpec::new("'2001-01-01'", "'2010-01-01'", AxisIncrement::Year)
    }

    #[test]
    fn accepts_plain_request() {
        let req = AggregateRequest::new(vec![
            Line::select("COUNT(*) AS MyCount"),
            Line::select("Category AS Cat"),
            Line::table("testTable"),
            Line::group_by("Category"),
        ]);
        assert!(validate_request(&req).is_ok());
    }

    #[test]
    fn rejects_two_pivot_selects() {
        let req = AggregateRequest::new(vec![
            Line::select("a").with_role(Role::Pivot),
            Line::select("b").with_role(Role::Pivot),
        ]);
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("pivot select"));
    }

    #[test]
    fn rejects_count_function_outside_select() {
        let req = AggregateRequest::new(vec![Line::having("COUNT(*) > 1").with_role(Role::CountFunction)]);
        assert!(matches!(validate_request(&req), Err(AggsqlError::InvalidRequest(_))));
    }

    #[test]
    fn axis_spec_and_axis_select_come_together() {
        let missing_select = AggregateRequest::new(vec![Line::select("COUNT(*) AS n")]).with_axis(axis());
        let err = validate_request(&missing_select).unwrap_err();
        assert!(err.to_string().contains("no select line has the Axis role"));

        let missing_spec = AggregateRequest::new(vec![
            Line::select("EventDate").with_role(Role::Axis),
            Line::group_by("EventDate").with_role(Role::Axis),
        ]);
        let err = validate_request(&missing_spec).unwrap_err();
        assert!(err.to_string().contains("no axis spec"));
    }

    #[test]
    fn axis_select_needs_axis_group_by() {
        let req = AggregateRequest::new(vec![Line::select("EventDate").with_role(Role::Axis)])
            .with_axis(axis());
        assert!(matches!(validate_request(&req), Err(AggsqlError::InvalidRequest(_))));
    }

    #[test]
    fn surfaces_bad_top_x() {
        let req = AggregateRequest::new(vec![Line::postfix("LIMIT many").with_role(Role::TopX)]);
        assert!(matches!(validate_request(&req), Err(AggsqlError::InvalidTopX(_))));
    }
}
