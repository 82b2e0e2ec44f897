//! Per-column match filters.
//!
//! A filter expression names a column, an operator and a value:
//!
//! ```text
//! RESTARTS>3        numeric comparison on numeric columns
//! NAME=nginx        exact, case sensitive
//! NAME!=nginx       negated exact
//! IMAGE~alpine      contains
//! STATE in (Running,Waiting)
//! ```

use std::cmp::Ordering;

use crate::lib::cell::Cell;
use crate::lib::error::TableError;

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Equals,
    Contains,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Set(Vec<String>),
}

/// Longest operators first so `<=` wins over `<`.
const OPERATORS: [(&str, Operator, bool); 9] = [
    ("==", Operator::Equals, false),
    ("!=", Operator::Equals, true),
    ("!~", Operator::Contains, true),
    ("<=", Operator::LessOrEqual, false),
    (">=", Operator::GreaterOrEqual, false),
    ("=", Operator::Equals, false),
    ("~", Operator::Contains, false),
    ("<", Operator::Less, false),
    (">", Operator::Greater, false),
];

/// A predicate evaluated against the text (or magnitude) of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilter {
    pub value: String,
    pub operator: Operator,
    pub negated: bool,
}

impl MatchFilter {
    pub fn equals(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            operator: Operator::Equals,
            negated: false,
        }
    }

    pub fn not_equals(value: impl Into<String>) -> Self {
        Self {
            negated: true,
            ..Self::equals(value)
        }
    }

    /// Split `COLUMN<op>value` into the column name and its filter.
    pub fn parse(expression: &str) -> Result<(String, Self), TableError> {
        let invalid = || TableError::InvalidFilter(expression.to_string());

        if let Some((column, values, negated)) = parse_set(expression) {
            if column.is_empty() {
                return Err(invalid());
            }
            let filter = Self {
                value: values.join(","),
                operator: Operator::Set(values),
                negated,
            };
            return Ok((column, filter));
        }

        let start = expression
            .find(|c| matches!(c, '=' | '!' | '~' | '<' | '>'))
            .ok_or_else(invalid)?;
        let rest = &expression[start..];
        let (symbol, operator, negated) = OPERATORS
            .iter()
            .find(|(symbol, _, _)| rest.starts_with(symbol))
            .ok_or_else(invalid)?;

        let column = expression[..start].trim();
        if column.is_empty() {
            return Err(invalid());
        }
        let value = rest[symbol.len()..].trim();

        Ok((
            column.to_string(),
            Self {
                value: value.to_string(),
                operator: operator.clone(),
                negated: *negated,
            },
        ))
    }

    /// Evaluate the filter; `numeric_column` enables magnitude comparisons.
    pub fn matches(&self, cell: &Cell, numeric_column: bool) -> bool {
        let text = cell.as_str();
        let found = match &self.operator {
            Operator::Equals => text == self.value,
            Operator::Contains => text.contains(self.value.as_str()),
            Operator::Set(values) => values.iter().any(|v| v == text),
            Operator::Less => self.compare(cell, numeric_column) == Ordering::Less,
            Operator::LessOrEqual => self.compare(cell, numeric_column) != Ordering::Greater,
            Operator::Greater => self.compare(cell, numeric_column) == Ordering::Greater,
            Operator::GreaterOrEqual => self.compare(cell, numeric_column) != Ordering::Less,
        };
        found != self.negated
    }

    fn compare(&self, cell: &Cell, numeric_column: bool) -> Ordering {
        if numeric_column && cell.is_numeric() {
            if let Ok(wanted) = self.value.parse::<f64>() {
                return cell.magnitude().total_cmp(&wanted);
            }
        }
        cell.as_str().cmp(self.value.as_str())
    }
}

/// Recognise `COLUMN in (a,b)` and `COLUMN notin (a,b)`.
fn parse_set(expression: &str) -> Option<(String, Vec<String>, bool)> {
    let open = expression.find('(')?;
    let inner = expression[open + 1..].trim_end().strip_suffix(')')?;
    let head = expression[..open].trim_end();
    let lower = head.to_ascii_lowercase();

    let (column, negated) = if lower.ends_with(" notin") {
        (&head[..head.len() - " notin".len()], true)
    } else if lower.ends_with(" in") {
        (&head[..head.len() - " in".len()], false)
    } else {
        return None;
    };

    let values = inner
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Some((column.trim().to_string(), values, negated))
}
