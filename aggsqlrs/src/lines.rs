//! Tagged SQL fragments.
//!
//! A [`Line`] is one piece of content for one clause of a statement. Clause
//! keywords, separating commas and `AND` joiners are never part of a line;
//! the section renderer in [`crate::sql_ast`] adds them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr_utils::{runtime_name, split_alias, split_outermost_function};

/// Position of a fragment within a statement. Variants are declared in
/// statement order, so the derived `Ord` is the clause order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Statements that must run before the query (session settings, variables).
    PreSelect,
    Select,
    From,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Postfix,
}

/// What a fragment means to aggregate synthesis, on top of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    None,
    /// The expression whose distinct values become columns.
    Pivot,
    /// The date expression binned onto the calendar axis.
    Axis,
    /// The aggregate (e.g. `COUNT(*)`) that is ranked, binned and pivoted.
    CountFunction,
    /// Row/column cap (`Postfix`/`Select`) or its tie-break ordering (`OrderBy`).
    TopX,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub slot: Slot,
    #[serde(default)]
    pub role: Role,
}

impl Line {
    pub fn new(text: impl Into<String>, slot: Slot) -> Self {
        Self {
            text: text.into(),
            slot,
            role: Role::None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// A copy of this line carrying different text; slot and role are kept.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            slot: self.slot,
            role: self.role,
        }
    }

    pub fn pre_select(text: impl Into<String>) -> Self {
        Self::new(text, Slot::PreSelect)
    }

    pub fn select(text: impl Into<String>) -> Self {
        Self::new(text, Slot::Select)
    }

    /// A `FROM` entry: the table, or a following `JOIN ... ON ...` line.
    pub fn table(text: impl Into<String>) -> Self {
        Self::new(text, Slot::From)
    }

    pub fn filter(text: impl Into<String>) -> Self {
        Self::new(text, Slot::Where)
    }

    pub fn group_by(text: impl Into<String>) -> Self {
        Self::new(text, Slot::GroupBy)
    }

    pub fn having(text: impl Into<String>) -> Self {
        Self::new(text, Slot::Having)
    }

    pub fn order_by(text: impl Into<String>) -> Self {
        Self::new(text, Slot::OrderBy)
    }

    pub fn postfix(text: impl Into<String>) -> Self {
        Self::new(text, Slot::Postfix)
    }

    /// Row cap of `n`, rendered by each dialect in its own limiting syntax.
    pub fn top_x(n: u64) -> Self {
        Self::new(n.to_string(), Slot::Postfix).with_role(Role::TopX)
    }

    pub fn is(&self, slot: Slot, role: Role) -> bool {
        self.slot == slot && self.role == role
    }

    /// Explicit alias (`... AS alias`), unquoted.
    pub fn alias(&self) -> Option<String> {
        split_alias(&self.text).1
    }

    /// The fragment with any trailing alias removed.
    pub fn text_without_alias(&self) -> &str {
        split_alias(&self.text).0
    }

    /// Explicit alias, else the column name of a plain column reference.
    pub fn runtime_name(&self) -> Option<String> {
        runtime_name(&self.text)
    }

    /// `COUNT(*) AS n` gives `("COUNT", "*")`.
    pub fn split_function(&self) -> Option<(String, String)> {
        split_outermost_function(self.text_without_alias())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
