//! Command-line parameter parsing

use crate::{Error, Result};

/// Split a `key=value` argument into its parts.
///
/// Only the first `=` separates key from value, so values may themselves
/// contain `=` (JSON targeting specs, URLs with query strings).
pub fn parse_param(input: &str) -> Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| Error::invalid_param(input, "expected key=value"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::invalid_param(input, "parameter name is empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(Error::invalid_param(input, "parameter name contains whitespace"));
    }

    Ok((key.to_string(), value.to_string()))
}

/// Split a comma-separated field list, dropping empty entries and
/// preserving the caller's order.
#[must_use]
pub fn parse_fields(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_equals_only() {
        let (k, v) = parse_param("targeting={\"geo\":\"a=b\"}").unwrap();
        assert_eq!(k, "targeting");
        assert_eq!(v, "{\"geo\":\"a=b\"}");
    }

    #[test]
    fn empty_value_is_allowed() {
        assert_eq!(
            parse_param("name=").unwrap(),
            ("name".to_string(), String::new())
        );
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(matches!(
            parse_param("name"),
            Err(Error::InvalidParam { .. })
        ));
        assert!(parse_param("=value").is_err());
        assert!(parse_param("bad key=value").is_err());
    }

    #[test]
    fn field_lists_keep_order_and_skip_blanks() {
        assert_eq!(
            parse_fields("name, id,,status "),
            vec!["name", "id", "status"]
        );
        assert!(parse_fields("").is_empty());
    }
}
