//! Fixed-column fields of V2000 lines and the coordinate codec.
//!
//! One reader serves both well-formed and ragged input: a field that lies
//! past the end of a short line is absent and takes its default, while a
//! field that is present but malformed goes through [`Diagnostics::field`],
//! which fails the record in strict mode.

use std::ops::Range;

use super::error::{Diagnostics, Result};

/// Parses a decimal with exactly four fractional digits (`-12.3456`) using
/// integer arithmetic. Returns `None` for any other layout.
pub fn parse_fixed_decimal(s: &str) -> Option<f64> {
    let t = s.trim();
    let (negative, digits) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let (whole, frac) = digits.split_once('.')?;
    if frac.len() != 4 || whole.len() > 12 {
        return None;
    }
    if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: i64 = frac.parse().ok()?;
    let value = (whole * 10_000 + frac) as f64 / 10_000.0;
    Some(if negative { -value } else { value })
}

/// Reads a coordinate field: the fixed four-decimal layout first, any
/// decimal notation otherwise.
pub fn read_coordinate(s: &str) -> Option<f64> {
    parse_fixed_decimal(s).or_else(|| s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// Formats a coordinate right-aligned in ten columns with four decimals.
pub fn format_coordinate(x: f64) -> String {
    format!("{:>10.4}", clean_coordinate(x))
}

/// Rounds to four decimals and folds negative zero, so `-0.00001` is not
/// written as `-0.0000`.
pub(crate) fn clean_coordinate(x: f64) -> f64 {
    let rounded = (x * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 || !rounded.is_finite() {
        0.0
    } else {
        rounded
    }
}

/// A line addressed by 0-based column ranges.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns<'a> {
    line: &'a str,
    full: &'a str,
    number: usize,
}

impl<'a> Columns<'a> {
    pub(crate) fn new(line: &'a str, number: usize) -> Self {
        Self {
            line: line.trim_end(),
            full: line,
            number,
        }
    }

    pub(crate) fn number(&self) -> usize {
        self.number
    }

    pub(crate) fn len(&self) -> usize {
        self.line.len()
    }

    pub(crate) fn line(&self) -> &'a str {
        self.line
    }

    /// Raw text in `range`, clipped to the line; `None` when the line ends
    /// before the range starts.
    pub(crate) fn raw(&self, range: Range<usize>) -> Option<&'a str> {
        if range.start >= self.line.len() {
            return None;
        }
        let end = range.end.min(self.line.len());
        self.line.get(range.start..end)
    }

    /// Trimmed text in `range`, empty when absent.
    pub(crate) fn text(&self, range: Range<usize>) -> &'a str {
        self.raw(range).map(str::trim).unwrap_or("")
    }

    /// Text from `start` to the end of the line, trailing blanks included.
    pub(crate) fn rest(&self, start: usize) -> &'a str {
        self.full.get(start..).unwrap_or("")
    }

    /// Integer field. Blank or absent fields give `default`.
    pub(crate) fn int(&self, range: Range<usize>, default: i64, diags: &mut Diagnostics) -> Result<i64> {
        let text = self.text(range.clone());
        if text.is_empty() {
            return Ok(default);
        }
        match text.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                diags.field(self.number, range, format!("invalid number '{text}'"))?;
                Ok(default)
            }
        }
    }

    /// Integer field that must parse; absent or blank fields are an error
    /// as well.
    pub(crate) fn required_int(&self, range: Range<usize>) -> Option<i64> {
        self.text(range).parse().ok()
    }

    /// Coordinate field; malformed values read as zero.
    pub(crate) fn coordinate(&self, range: Range<usize>, diags: &mut Diagnostics) -> Result<f64> {
        let text = self.text(range.clone());
        if text.is_empty() {
            return Ok(0.0);
        }
        match read_coordinate(text) {
            Some(value) => Ok(value),
            None => {
                diags.field(self.number, range, format!("invalid coordinate '{text}'"))?;
                Ok(0.0)
            }
        }
    }

    /// True when the line stops inside `range` rather than before it.
    pub(crate) fn cuts(&self, range: Range<usize>) -> bool {
        self.line.len() > range.start && self.line.len() < range.end
    }
}
