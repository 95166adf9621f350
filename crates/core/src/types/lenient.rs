//! Lenient integer parsing for query strings and loosely-typed JSON.
//!
//! Browsers and API clients send page numbers, page sizes and bulk cart
//! quantities as whatever they have at hand: `"2"`, `2`, `2.0`, `" 3items"`.
//! These helpers read the leading integer and report `None` for anything
//! that does not start with one.

use serde_json::Value;

/// Parse the leading integer of a string.
///
/// Leading whitespace and a single sign are accepted; parsing stops at the
/// first non-digit. Values beyond the `i64` range saturate.
///
/// ```
/// use emporium_core::types::lenient::int_prefix;
///
/// assert_eq!(int_prefix("42"), Some(42));
/// assert_eq!(int_prefix("  -7 apples"), Some(-7));
/// assert_eq!(int_prefix("2.9"), Some(2));
/// assert_eq!(int_prefix("abc"), None);
/// ```
#[must_use]
pub fn int_prefix(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, s.get(1..)?),
        Some(b'+') => (false, s.get(1..)?),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut seen_digit = false;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        seen_digit = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }

    if !seen_digit {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Read a JSON value as an integer the lenient way.
///
/// Numbers are truncated toward zero, strings go through [`int_prefix`],
/// everything else (booleans, null, arrays, objects) yields `None`.
#[must_use]
pub fn json_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64().filter(|f| f.is_finite()).map(|f| {
                #[allow(clippy::cast_possible_truncation)] // saturating cast is the intent
                let truncated = f.trunc() as i64;
                truncated
            })
        }),
        Value::String(s) => int_prefix(s),
        _ => None,
    }
}
