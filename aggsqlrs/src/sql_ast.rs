//! Named-section statement model.
//!
//! Synthesizers fill the sections of a [`SelectQuery`]; [`SqlRenderer`] is
//! the one place that decides clause order, keywords and separators.

use crate::dialect::{Dialect, LimitClause};
use crate::expr_utils::is_wrapped_in_parens;
use crate::lines::{Line, Role, Slot};

/// A common table expression.
#[derive(Debug, Clone)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub body: String,
    pub recursive: bool,
}

impl Cte {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            body: body.into(),
            recursive: false,
        }
    }

    pub fn recursive(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recursive: true,
            ..Self::new(name, body)
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub pre_select: Vec<String>,
    pub with: Vec<Cte>,
    pub select: Vec<String>,
    pub from: Vec<String>,
    pub filters: Vec<String>,
    pub group_by: Vec<String>,
    pub having: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub postfix: Vec<String>,
}

impl SelectQuery {
    /// Partition lines into sections, keeping insertion order within each.
    ///
    /// TopX count lines are skipped (the count is applied through
    /// [`SelectQuery::limit`]); TopX ordering lines stay ordinary ORDER BY
    /// items.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a Line>) -> Self {
        let mut query = SelectQuery::default();
        for line in lines {
            if line.role == Role::TopX && line.slot != Slot::OrderBy {
                continue;
            }
            let text = line.text.clone();
            match line.slot {
                Slot::PreSelect => query.pre_select.push(text),
                Slot::Select => query.select.push(text),
                Slot::From => query.from.push(text),
                Slot::Where => query.filters.push(text),
                Slot::GroupBy => query.group_by.push(text),
                Slot::Having => query.having.push(text),
                Slot::OrderBy => query.order_by.push(text),
                Slot::Postfix => query.postfix.push(text),
            }
        }
        query
    }
}

pub struct SqlRenderer<'d> {
    dialect: &'d dyn Dialect,
}

impl<'d> SqlRenderer<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn render_select(&self, query: &SelectQuery) -> String {
        let (head, tail) = self.render_parts(query);
        format!("{head}{tail}")
    }

    /// Render a statement split right after its select list, so generated
    /// columns can be spliced in between at execution time.
    pub fn render_parts(&self, query: &SelectQuery) -> (String, String) {
        let limit = query.limit.map(|n| self.dialect.limit_clause(n));

        let mut head: Vec<String> = query.pre_select.clone();
        if !query.with.is_empty() {
            head.push(self.render_with(&query.with));
        }
        let select_kw = match &limit {
            Some(LimitClause::AfterSelect(top)) => format!("SELECT {top}"),
            _ => "SELECT".to_string(),
        };
        head.push(format!("{select_kw} {}", query.select.join(", ")));

        let mut tail: Vec<String> = Vec::new();
        if !query.from.is_empty() {
            tail.push(format!("FROM {}", query.from.join("\n")));
        }
        if !query.filters.is_empty() {
            tail.push(format!("WHERE {}", conjunction(&query.filters)));
        }
        if !query.group_by.is_empty() {
            tail.push(format!("GROUP BY {}", query.group_by.join(", ")));
        }
        if !query.having.is_empty() {
            tail.push(format!("HAVING {}", conjunction(&query.having)));
        }
        if !query.order_by.is_empty() {
            tail.push(format!("ORDER BY {}", query.order_by.join(", ")));
        }
        if let Some(LimitClause::Trailing(clause)) = limit {
            tail.push(clause);
        }
        tail.extend(query.postfix.iter().cloned());

        let tail = tail.iter().map(|t| format!("\n{t}")).collect::<String>();
        (head.join("\n"), tail)
    }

    pub fn render_with(&self, ctes: &[Cte]) -> String {
        let recursive = ctes.iter().any(|c| c.recursive) && self.dialect.recursive_cte_keyword();
        let rendered: Vec<String> = ctes
            .iter()
            .map(|cte| {
                let columns = if cte.columns.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", cte.columns.join(", "))
                };
                format!("{}{columns} AS (\n{}\n)", cte.name, cte.body)
            })
            .collect();
        let kw = if recursive { "WITH RECURSIVE" } else { "WITH" };
        format!("{kw} {}", rendered.join(",\n"))
    }
}

/// AND together predicates, parenthesising each when there is more than one
/// so a top-level OR cannot capture its neighbours.
fn conjunction(predicates: &[String]) -> String {
    if predicates.len() == 1 {
        return predicates[0].clone();
    }
    predicates
        .iter()
        .map(|p| {
            if is_wrapped_in_parens(p) {
                p.trim().to_string()
            } else {
                format!("({})", p.trim())
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
