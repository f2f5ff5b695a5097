//! Classification outcomes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
/// Ternary verdict of the embedding tier (`-1`, `0`, `1` on the wire).
pub enum Verdict {
    Negative,
    Uncertain,
    Positive,
}

impl Verdict {
    /// Maps a distance onto the ternary scale.
    ///
    /// `distance <= low` is positive, `distance >= high` is negative, anything between
    /// is uncertain. With `low == high` this degenerates to a single threshold where the
    /// boundary itself counts as a match.
    pub fn from_distance(distance: f64, low: f64, high: f64) -> Self {
        if distance <= low {
            Verdict::Positive
        } else if distance >= high {
            Verdict::Negative
        } else {
            Verdict::Uncertain
        }
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            Verdict::Negative => -1,
            Verdict::Uncertain => 0,
            Verdict::Positive => 1,
        }
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, Verdict::Uncertain)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Negative => "NEGATIVE",
            Verdict::Uncertain => "UNCERTAIN",
            Verdict::Positive => "POSITIVE",
        }
    }
}

impl From<Verdict> for i8 {
    fn from(verdict: Verdict) -> i8 {
        verdict.as_i8()
    }
}

impl TryFrom<i8> for Verdict {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Verdict::Negative),
            0 => Ok(Verdict::Uncertain),
            1 => Ok(Verdict::Positive),
            other => Err(format!("verdict must be -1, 0 or 1, got {other}")),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Terminal outcome of the cascade.
pub enum Decision {
    Match,
    NoMatch,
}

impl Decision {
    pub fn from_bool(is_match: bool) -> Self {
        if is_match {
            Decision::Match
        } else {
            Decision::NoMatch
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Decision::Match)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Match => f.write_str("MATCH"),
            Decision::NoMatch => f.write_str("NO_MATCH"),
        }
    }
}
