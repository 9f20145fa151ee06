//! Pure parsers turning raw OS tool output into typed values.
//!
//! Each function takes the complete text of one source and either extracts
//! its field or fails with [`ParseError`]. Nothing here touches the system.

pub mod linux;
pub mod windows;

use crate::error::ParseError;

/// Splits `key<sep>value` and trims both sides.
fn split_pair(line: &str, sep: char) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(sep)?;
    Some((key.trim(), value.trim()))
}

/// Returns the value of the first `key: value` line whose key equals `key`
/// ignoring ASCII case.
pub(crate) fn colon_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    colon_values(text, key).next()
}

/// Iterates the values of every `key: value` line whose key equals `key`.
pub(crate) fn colon_values<'a>(text: &'a str, key: &str) -> impl Iterator<Item = &'a str> {
    text.lines().filter_map(move |line| {
        let (k, v) = split_pair(line, ':')?;
        k.eq_ignore_ascii_case(key).then_some(v)
    })
}

/// Returns the leading numeric part of `value` (`"2800 MHz"` → `"2800"`).
pub(crate) fn leading_number(value: &str) -> &str {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    &value[..end]
}

pub(crate) fn parse_u32(field: &'static str, value: &str) -> Result<u32, ParseError> {
    leading_number(value)
        .parse()
        .map_err(|_| ParseError::invalid(field, value))
}

pub(crate) fn parse_u64(field: &'static str, value: &str) -> Result<u64, ParseError> {
    leading_number(value)
        .parse()
        .map_err(|_| ParseError::invalid(field, value))
}

pub(crate) fn parse_f64(field: &'static str, value: &str) -> Result<f64, ParseError> {
    leading_number(value)
        .parse()
        .map_err(|_| ParseError::invalid(field, value))
}

/// Rejects empty values so "unknown" never masquerades as a real string.
pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<String, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ParseError::invalid(field, value))
    } else {
        Ok(value.to_string())
    }
}

/// Converts a size such as `32K`, `32 KiB`, `8 MiB (1 instance)` or `512` (KiB) to KiB.
pub(crate) fn size_to_kib(field: &'static str, value: &str) -> Result<u64, ParseError> {
    let trimmed = value.trim();
    let number = leading_number(trimmed);
    let amount: f64 = number
        .parse()
        .map_err(|_| ParseError::invalid(field, value))?;
    let unit = trimmed[number.len()..]
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");

    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "k" | "kb" | "kib" => 1.0,
        "m" | "mb" | "mib" => 1024.0,
        "g" | "gb" | "gib" => 1024.0 * 1024.0,
        "b" => 1.0 / 1024.0,
        _ => return Err(ParseError::invalid(field, value)),
    };
    Ok((amount * factor).round() as u64)
}
