use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PipelineError, Result};

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").expect("score pattern is valid"));

/// Quality score reported by the scorer stage. Not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(pub f64);

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// Parse the first integer or decimal token, scanning left to right.
///
/// `\d` also matches non-ASCII digits, which `f64` cannot parse; those tokens
/// are skipped.
pub fn extract_score(response: &str) -> Result<Score> {
    NUMBER
        .find_iter(response)
        .find_map(|m| m.as_str().parse::<f64>().ok())
        .map(Score)
        .ok_or_else(|| PipelineError::ScoreParse {
            response: response.to_string(),
        })
}
