//! Parse-with-default helpers for best-effort numeric cells.
//!
//! Every function here is total: bad input yields the caller's default,
//! never an error and never a non-finite number.

/// Parse a float cell, falling back to `default`.
///
/// Surrounding whitespace is ignored. `inf`, `NaN` and overflowing literals
/// count as unparseable.
pub fn parse_f64_or(raw: &str, default: f64) -> f64 {
    parse_finite(raw).unwrap_or(default)
}

/// Parse an integer cell, falling back to `default`.
///
/// The cell is read as a decimal number first and then truncated toward zero,
/// so `"2.9"` gives `2` and `"1e3"` gives `1000`. Values outside the `i64`
/// range fall back to `default`.
pub fn parse_i64_or(raw: &str, default: i64) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }

    match parse_finite(trimmed) {
        Some(value) => {
            let truncated = value.trunc();
            if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                truncated as i64
            } else {
                default
            }
        }
        None => default,
    }
}

/// Parse a finite `f64`, or `None`.
pub(crate) fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_cells() {
        assert_eq!(parse_f64_or("10.5", 0.0), 10.5);
        assert_eq!(parse_f64_or("  3 ", 0.0), 3.0);
        assert_eq!(parse_f64_or("-1.25", 0.0), -1.25);
        assert_eq!(parse_f64_or("1e2", 0.0), 100.0);
    }

    #[test]
    fn test_float_defaults() {
        assert_eq!(parse_f64_or("", 0.0), 0.0);
        assert_eq!(parse_f64_or("abc", 0.0), 0.0);
        assert_eq!(parse_f64_or("12,50", 0.0), 0.0);
        assert_eq!(parse_f64_or("inf", 0.0), 0.0);
        assert_eq!(parse_f64_or("NaN", 0.0), 0.0);
        assert_eq!(parse_f64_or("1e400", 0.0), 0.0);
    }

    #[test]
    fn test_integer_cells_truncate() {
        assert_eq!(parse_i64_or("4", 0), 4);
        assert_eq!(parse_i64_or("2.9", 0), 2);
        assert_eq!(parse_i64_or("-2.9", 0), -2);
        assert_eq!(parse_i64_or("3.0", 0), 3);
        assert_eq!(parse_i64_or(" 7 ", 0), 7);
    }

    #[test]
    fn test_integer_defaults() {
        assert_eq!(parse_i64_or("", 0), 0);
        assert_eq!(parse_i64_or("two", 0), 0);
        assert_eq!(parse_i64_or("nan", 0), 0);
        assert_eq!(parse_i64_or("1e30", 0), 0);
    }
}
