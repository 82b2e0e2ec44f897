use std::cmp::Ordering;
use std::fmt;

/// Display colour attached to a numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourRank {
    #[default]
    None,
    Warning,
    Bad,
}

/// Percentage at or above which a cell is shown as a warning
pub const WARNING_PERCENTAGE: f64 = 75.0;

/// Percentage at or above which a cell is shown as bad
pub const BAD_PERCENTAGE: f64 = 90.0;

impl ColourRank {
    /// Pick a rank for a usage percentage
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= BAD_PERCENTAGE {
            ColourRank::Bad
        } else if percentage >= WARNING_PERCENTAGE {
            ColourRank::Warning
        } else {
            ColourRank::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CellKind {
    #[default]
    Text,
    Int,
    Float,
}

/// One display unit of a table row.
///
/// Numeric cells keep the raw magnitude next to the display text so that
/// sorting, filtering and the outlier scan never have to re-parse strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    text: String,
    number: i64,
    float: f64,
    kind: CellKind,
    colour: ColourRank,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn int(text: impl Into<String>, raw: i64) -> Self {
        Self {
            text: text.into(),
            number: raw,
            kind: CellKind::Int,
            ..Default::default()
        }
    }

    /// Integer cell displayed as its own value
    pub fn count(raw: i64) -> Self {
        Self::int(raw.to_string(), raw)
    }

    /// Non-finite values are stored as zero.
    pub fn float(text: impl Into<String>, raw: f64) -> Self {
        Self {
            text: text.into(),
            float: finite_or_zero(raw),
            kind: CellKind::Float,
            ..Default::default()
        }
    }

    pub fn coloured(rank: ColourRank, text: impl Into<String>, raw: f64) -> Self {
        Self {
            colour: rank,
            ..Self::float(text, raw)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn float_value(&self) -> f64 {
        self.float
    }

    pub fn is_numeric(&self) -> bool {
        self.kind != CellKind::Text
    }

    pub fn colour(&self) -> ColourRank {
        self.colour
    }

    /// Numeric value as a float, zero for text cells
    pub fn magnitude(&self) -> f64 {
        match self.kind {
            CellKind::Text => 0.0,
            CellKind::Int => self.number as f64,
            CellKind::Float => self.float,
        }
    }

    /// Width of the display text in characters
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Compare two numeric cells by value, keeping integer precision when both are integers
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        match (self.kind, other.kind) {
            (CellKind::Int, CellKind::Int) => self.number.cmp(&other.number),
            _ => self.magnitude().total_cmp(&other.magnitude()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Ratios with a zero denominator come back as NaN; those are reported as zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
