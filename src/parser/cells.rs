use std::sync::LazyLock;

use regex::Regex;

use crate::models::CompetitionResult;

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Cell positions of each result field in a rendered results row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub lifter: usize,
    pub body_weight: usize,
    pub snatch: [usize; 3],
    pub snatch_best: usize,
    pub cj: [usize; 3],
    pub cj_best: usize,
    pub total: usize,
}

impl ColumnLayout {
    /// Layout the published data file was generated with. `total` shares
    /// cell 13 with the first clean & jerk attempt.
    pub const LEGACY: ColumnLayout = ColumnLayout {
        lifter: 3,
        body_weight: 4,
        snatch: [8, 9, 10],
        snatch_best: 11,
        cj_best: 12,
        cj: [13, 14, 15],
        total: 13,
    };

    /// Map one row of cell texts to a result. `None` when the row has no
    /// lifter cell (placeholder rows); absent numeric cells read as 0.
    pub fn map_row<S: AsRef<str>>(&self, cells: &[S]) -> Option<CompetitionResult> {
        if cells.len() <= self.lifter {
            return None;
        }
        let num = |i: usize| cells.get(i).map_or(0.0, |c| parse_number(c.as_ref()));

        Some(CompetitionResult {
            lifter: normalize_text(cells[self.lifter].as_ref()),
            body_weight: num(self.body_weight),
            snatch1: num(self.snatch[0]),
            snatch2: num(self.snatch[1]),
            snatch3: num(self.snatch[2]),
            snatch: num(self.snatch_best),
            cj1: num(self.cj[0]),
            cj2: num(self.cj[1]),
            cj3: num(self.cj[2]),
            cj: num(self.cj_best),
            total: num(self.total),
        })
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::LEGACY
    }
}

/// Parse a cell as a number; anything that isn't a finite float is 0.
pub fn parse_number(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    WS_RE.replace_all(text.trim(), " ").into_owned()
}
