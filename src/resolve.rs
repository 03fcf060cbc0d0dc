//! Turns command tokens into a span of time blocks and a list of values.
//!
//! The first token is read as a time: a `"4-6"` range, a single `"4"`, or
//! neither, in which case every block of the day is targeted and the token
//! is the first value. The remaining tokens are joined with spaces and split
//! on `", "`, so multi-word values survive tokenisation:
//!
//! ```text
//! 4-6 Scrim, Practice, Free   -> blocks [0, 1, 2], three values
//! 5 Scrim                     -> block [1], one value
//! Off                         -> blocks [0..6], broadcast "Off"
//! ```

use regex::Regex;
use std::sync::OnceLock;

use crate::error::RangeError;
use crate::schedule::BLOCKS;

const RANGE_PATTERN: &str = r"^\d{1,2}-\d{1,2}$";

fn range_regex() -> Option<&'static Regex> {
    static RANGE: OnceLock<Option<Regex>> = OnceLock::new();
    RANGE.get_or_init(|| Regex::new(RANGE_PATTERN).ok()).as_ref()
}

/// Target blocks and the values to write into them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Block indices in ascending order.
    pub blocks: Vec<usize>,
    /// Either one value for every block or one per block.
    pub values: Vec<String>,
}

impl Resolution {
    /// `(block, value)` pairs, broadcasting a single value.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, &str)> {
        let broadcast = self.values.len() == 1;
        self.blocks.iter().enumerate().map(move |(i, block)| {
            let value = if broadcast { &self.values[0] } else { &self.values[i] };
            (*block, value.as_str())
        })
    }
}

/// Resolve `tokens` against a day that starts at `start_time`.
///
/// When `valid_values` is non-empty each value must match one of its
/// entries ignoring case and is replaced by that entry's spelling.
///
/// # Errors
///
/// Returns a [`RangeError`] naming the offending token or counts.
pub fn resolve(
    start_time: u32,
    tokens: &[String],
    valid_values: &[String],
) -> Result<Resolution, RangeError> {
    let Some(first) = tokens.first() else {
        return Err(RangeError::ArgumentCountMismatch {
            cells: BLOCKS,
            values: 0,
        });
    };

    let (blocks, value_tokens) = if range_regex().is_some_and(|re| re.is_match(first)) {
        let (lo, hi) = first.split_once('-').unwrap_or((first.as_str(), first.as_str()));
        // One or two digits each, guaranteed by the range pattern.
        let lo: u32 = lo.parse().unwrap_or(0);
        let hi: u32 = hi.parse().unwrap_or(0);
        if lo < start_time {
            return Err(RangeError::InvalidStartTime {
                time: lo,
                start: start_time,
            });
        }
        if lo > hi {
            return Err(RangeError::InvertedRange {
                token: first.clone(),
            });
        }
        (span(lo, hi, start_time)?, &tokens[1..])
    } else if let Ok(time) = first.parse::<u32>() {
        if time < start_time {
            return Err(RangeError::InvalidStartTime {
                time,
                start: start_time,
            });
        }
        (span(time, time, start_time)?, &tokens[1..])
    } else {
        ((0..BLOCKS).collect(), tokens)
    };

    let values = split_values(value_tokens);
    if values.is_empty() {
        return Err(RangeError::ArgumentCountMismatch {
            cells: blocks.len(),
            values: 0,
        });
    }
    let values = canonicalize(values, valid_values)?;

    if values.len() != 1 && values.len() != blocks.len() {
        return Err(RangeError::ArgumentCountMismatch {
            cells: blocks.len(),
            values: values.len(),
        });
    }
    Ok(Resolution { blocks, values })
}

fn span(lo: u32, hi: u32, start_time: u32) -> Result<Vec<usize>, RangeError> {
    let last = start_time.saturating_add(BLOCKS as u32 - 1);
    if hi > last {
        return Err(RangeError::TimeOutOfRange { time: hi, last });
    }
    Ok(((lo - start_time) as usize..=(hi - start_time) as usize).collect())
}

fn split_values(tokens: &[String]) -> Vec<String> {
    let joined = tokens.join(" ");
    if joined.trim().is_empty() {
        return Vec::new();
    }
    joined.split(", ").map(|v| v.trim().to_string()).collect()
}

fn canonicalize(values: Vec<String>, valid_values: &[String]) -> Result<Vec<String>, RangeError> {
    if valid_values.is_empty() {
        return Ok(values);
    }
    values
        .into_iter()
        .map(|value| {
            valid_values
                .iter()
                .find(|v| v.eq_ignore_ascii_case(&value))
                .cloned()
                .ok_or(RangeError::InvalidActivity(value))
        })
        .collect()
}
