//! Lenient deserializers for query-string filters sent by HTML forms.

use serde::{de, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Treats a missing or blank value as `None` and parses anything else with `FromStr`.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Like [`empty_as_none`], but the select-box sentinel `all` also means "no filter".
pub fn empty_or_all_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Trims free text and drops it entirely when nothing is left.
pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "empty_as_none")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "empty_or_all_as_none")]
        kind: Option<u8>,
    }

    #[test]
    fn blank_and_all_values_are_absent() {
        let probe: Probe =
            serde_json::from_value(serde_json::json!({ "price": " ", "kind": "all" }))
                .expect("probe parses");
        assert!(probe.price.is_none());
        assert!(probe.kind.is_none());
    }

    #[test]
    fn numbers_parse_and_garbage_fails() {
        let probe: Probe = serde_json::from_value(serde_json::json!({ "price": "2500.5" }))
            .expect("probe parses");
        assert_eq!(probe.price, Some(2500.5));

        let err = serde_json::from_value::<Probe>(serde_json::json!({ "price": "cheap" }));
        assert!(err.is_err());
    }

    #[test]
    fn trimmed_discards_whitespace() {
        assert_eq!(trimmed(Some("  hi ".into())), Some("hi".into()));
        assert_eq!(trimmed(Some("   ".into())), None);
    }
}
