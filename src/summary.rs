//! Summarizing a raw metric value.
//!
//! Log fields hold comma-separated samples (`"12,,7.5,3"`). A [`SummaryType`]
//! collapses them into a single statistic. Two tokenizations exist and must
//! stay separate: `nzmean` drops empty samples, every other numeric type reads
//! an empty sample as `0.0`. A sample that is not a number discards the whole
//! list, and an empty list summarizes to `0`.

use std::fmt;
use std::str::FromStr;

/// How a metric's samples are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryType {
    Sum,
    Mean,
    /// Mean over the non-empty samples only.
    NzMean,
    Min,
    Max,
    /// Sample standard deviation (N-1 divisor).
    StandardDeviation,
    /// Sample variance (N-1 divisor).
    Variance,
    /// The raw value, untouched.
    Array,
}

impl FromStr for SummaryType {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(SummaryType::Sum),
            "mean" => Ok(SummaryType::Mean),
            "nzmean" => Ok(SummaryType::NzMean),
            "min" => Ok(SummaryType::Min),
            "max" => Ok(SummaryType::Max),
            "standard_deviation" => Ok(SummaryType::StandardDeviation),
            "variance" => Ok(SummaryType::Variance),
            "array" => Ok(SummaryType::Array),
            other => Err(SummaryError::InvalidType(other.to_string())),
        }
    }
}

/// Error for a metric declared with an unknown summary type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    InvalidType(String),
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryError::InvalidType(kind) => write!(f, "invalid summary type: {kind}"),
        }
    }
}

impl std::error::Error for SummaryError {}

/// A summarized metric, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// No usable samples, or too few for a spread statistic.
    Zero,
    Value(f64),
    Raw(String),
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Zero => f.write_str("0"),
            Summary::Value(v) => f.write_str(&format_float(*v)),
            Summary::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Split a raw value into samples using the tokenization for `kind`.
///
/// Returns an empty list if any non-empty sample fails to parse.
pub fn convert_tokens(value: &str, kind: SummaryType) -> Vec<f64> {
    let parsed: Option<Vec<f64>> = if kind == SummaryType::NzMean {
        value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(parse_sample)
            .collect()
    } else {
        value
            .split(',')
            .map(str::trim)
            .map(|t| if t.is_empty() { Some(0.0) } else { parse_sample(t) })
            .collect()
    };
    parsed.unwrap_or_default()
}

/// Parse one sample. Underscores are accepted between digits (`1_000`).
fn parse_sample(token: &str) -> Option<f64> {
    if !token.contains('_') {
        return token.parse().ok();
    }
    let bytes = token.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });
    if !grouped {
        return None;
    }
    token.replace('_', "").parse().ok()
}

/// Summarize a raw field value.
pub fn summarize(value: &str, kind: SummaryType) -> Summary {
    if kind == SummaryType::Array {
        return Summary::Raw(value.to_string());
    }

    let numbers = convert_tokens(value, kind);
    if numbers.is_empty() {
        return Summary::Zero;
    }

    match kind {
        SummaryType::Sum => Summary::Value(numbers.iter().sum()),
        SummaryType::Mean | SummaryType::NzMean => Summary::Value(mean(&numbers).0),
        SummaryType::Min => Summary::Value(first_wins(&numbers, |x, best| x < best)),
        SummaryType::Max => Summary::Value(first_wins(&numbers, |x, best| x > best)),
        SummaryType::StandardDeviation => match sample_variance(&numbers) {
            Some(var) => Summary::Value(var.sqrt()),
            None => Summary::Zero,
        },
        SummaryType::Variance => match sample_variance(&numbers) {
            Some(var) => Summary::Value(var),
            None => Summary::Zero,
        },
        SummaryType::Array => unreachable!("array handled above"),
    }
}

/// Summarize a value against a type name as declared in the metric file.
///
/// An unknown type tokenizes like `sum` and is only an error when there are
/// samples to reduce; unusable samples still summarize to `0`.
pub fn summarize_declared(value: &str, kind: &str) -> Result<Summary, SummaryError> {
    match kind.parse::<SummaryType>() {
        Ok(kind) => Ok(summarize(value, kind)),
        Err(_) if convert_tokens(value, SummaryType::Sum).is_empty() => Ok(Summary::Zero),
        Err(e) => Err(e),
    }
}

/// Keep the first sample unless a later one is strictly `better`.
/// A leading NaN therefore sticks, and later NaNs are skipped.
fn first_wins(numbers: &[f64], better: impl Fn(f64, f64) -> bool) -> f64 {
    numbers[1..]
        .iter()
        .fold(numbers[0], |best, &x| if better(x, best) { x } else { best })
}

/// Mean rounded once from the exact sum, plus the leftover `exact - rounded`.
fn mean(numbers: &[f64]) -> (f64, f64) {
    let mut sum = ExactSum::default();
    for &x in numbers {
        sum.add(x);
    }
    sum.div(numbers.len() as f64)
}

/// Bessel-corrected variance; `None` with fewer than two samples.
fn sample_variance(numbers: &[f64]) -> Option<f64> {
    if numbers.len() < 2 {
        return None;
    }
    let (m, leftover) = mean(numbers);

    // Sum of (x - m)^2 kept exact through two_sum/fma splits.
    let mut squares = ExactSum::default();
    for &x in numbers {
        let (dh, dl) = two_sum(x, -m);
        let hh = dh * dh;
        squares.add(hh);
        squares.add(dh.mul_add(dh, -hh));
        let cross = 2.0 * dh * dl;
        squares.add(cross);
        squares.add((2.0 * dh).mul_add(dl, -cross));
        squares.add(dl * dl);
    }
    // Deviations were taken from the rounded mean, not the exact one.
    squares.add(-(numbers.len() as f64) * leftover * leftover);

    Some(squares.div((numbers.len() - 1) as f64).0)
}

fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let hi = a + b;
    let b_virtual = hi - a;
    let lo = (a - (hi - b_virtual)) + (b - b_virtual);
    (hi, lo)
}

/// Exact running sum of floats as non-overlapping partials (Shewchuk).
#[derive(Debug, Default)]
struct ExactSum {
    partials: Vec<f64>,
    nonfinite: Option<f64>,
}

impl ExactSum {
    fn add(&mut self, mut x: f64) {
        if !x.is_finite() {
            self.nonfinite = Some(self.nonfinite.map_or(x, |s| s + x));
            return;
        }
        let mut kept = 0;
        for i in 0..self.partials.len() {
            let mut y = self.partials[i];
            if x.abs() < y.abs() {
                std::mem::swap(&mut x, &mut y);
            }
            let hi = x + y;
            let lo = y - (hi - x);
            if lo != 0.0 {
                self.partials[kept] = lo;
                kept += 1;
            }
            x = hi;
        }
        self.partials.truncate(kept);
        self.partials.push(x);
    }

    /// The exact sum rounded to nearest, ties to even.
    fn value(&self) -> f64 {
        if let Some(s) = self.nonfinite {
            return s;
        }
        let mut n = self.partials.len();
        if n == 0 {
            return 0.0;
        }
        n -= 1;
        let mut hi = self.partials[n];
        let mut lo = 0.0;
        while n > 0 {
            let x = hi;
            n -= 1;
            let y = self.partials[n];
            hi = x + y;
            lo = y - (hi - x);
            if lo != 0.0 {
                break;
            }
        }
        // Halfway case: the remaining partials decide which way to round.
        if n > 0
            && ((lo < 0.0 && self.partials[n - 1] < 0.0)
                || (lo > 0.0 && self.partials[n - 1] > 0.0))
        {
            let y = lo * 2.0;
            let x = hi + y;
            if y == x - hi {
                hi = x;
            }
        }
        hi
    }

    /// `sum / d` rounded once, and the leftover `sum / d - quotient`.
    ///
    /// The first quotient is corrected by the exactly computed remainder.
    fn div(mut self, d: f64) -> (f64, f64) {
        let q = self.value() / d;
        if !q.is_finite() || q == 0.0 {
            return (q, 0.0);
        }
        let p = q * d;
        self.add(-p);
        self.add(-q.mul_add(d, -p));
        let correction = self.value() / d;
        let rounded = q + correction;
        (rounded, (q - rounded) + correction)
    }
}

/// Render a float the way downstream tooling expects: shortest round-trip
/// digits, a trailing `.0` on integral values, and scientific notation
/// outside `1e-4 <= |v| < 1e16`.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{v:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let plain = format!("{v}");
        if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}
