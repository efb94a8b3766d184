//! Observation text blocks
//!
//! weewx embeds its readings as loosely formatted `Name: value` lines inside
//! the `content:encoded` element of each RSS item. The parser here is
//! deliberately forgiving: lines it cannot read are skipped, never reported.

use std::collections::HashMap;

/// Flat mapping from field name (spaces removed) to trimmed value
pub type FieldMap = HashMap<String, String>;

/// Parse one observation block into a [`FieldMap`]
///
/// Each line is split on its first `:`. The name loses surrounding and
/// internal spaces, the value is trimmed, cut at the first `&` or `<` (HTML
/// entities and tags trailing the reading) and has decimal commas turned into
/// dots. Lines without a `:` are ignored and later duplicates win.
#[must_use]
pub fn parse_text_block(block: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    for line in block.split(['\r', '\n']).filter(|l| !l.is_empty()) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim().replace(' ', "");
        let value = value
            .trim()
            .split(['&', '<'])
            .next()
            .unwrap_or_default()
            .replace(',', ".");

        fields.insert(name, value);
    }

    fields
}

/// Spelling of an infinite reading
const INFINITY_LITERAL: &str = "Infinity";

/// Parse the numeric prefix of a string as a float
///
/// Leading whitespace is skipped and anything after the number is ignored,
/// so `"85%"` reads as `85.0` and `"1013.2 mbar"` as `1013.2`. A signed or
/// bare `Infinity` prefix reads as infinity. Returns NaN when no digits are
/// found.
#[must_use]
pub fn parse_leading_float(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    if s[end..].starts_with(INFINITY_LITERAL) {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when at least one digit follows it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

/// Parse the integer prefix of a string
///
/// `"225°"` reads as `225` and `"22.5"` as `22`. Returns `None` when the
/// string does not start with digits.
#[must_use]
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    s[..end].parse().ok()
}
