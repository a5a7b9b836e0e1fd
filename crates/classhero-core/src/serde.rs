//! Query-string friendly deserializers.
//!
//! Query parameters arrive as strings and an empty value (`?search=`) means
//! "not provided". These helpers map empty strings to `None` and parse the rest.
//! [`deserialize_trimmed_string`] covers required body fields such as emails.

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// `"true"`/`"1"` parse as `true`, any other non-empty value as `false`.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(match opt {
        Some(s) if s.is_empty() => None,
        Some(s) => Some(s.eq_ignore_ascii_case("true") || s == "1"),
        None => None,
    })
}

pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Required string with surrounding whitespace removed, so validation sees
/// the value that will be stored.
pub fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        search: Option<String>,
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let f: Filters = serde_json::from_str(r#"{"flag":"","search":"  ","id":""}"#).unwrap();
        assert_eq!(f.flag, None);
        assert_eq!(f.search, None);
        assert_eq!(f.id, None);
    }

    #[test]
    fn test_missing_values_are_none() {
        let f: Filters = serde_json::from_str("{}").unwrap();
        assert_eq!(f.flag, None);
        assert_eq!(f.search, None);
    }

    #[test]
    fn test_bool_parsing() {
        let f: Filters = serde_json::from_str(r#"{"flag":"true"}"#).unwrap();
        assert_eq!(f.flag, Some(true));
        let f: Filters = serde_json::from_str(r#"{"flag":"TRUE"}"#).unwrap();
        assert_eq!(f.flag, Some(true));
        let f: Filters = serde_json::from_str(r#"{"flag":"false"}"#).unwrap();
        assert_eq!(f.flag, Some(false));
        let f: Filters = serde_json::from_str(r#"{"flag":"nope"}"#).unwrap();
        assert_eq!(f.flag, Some(false));
    }

    #[test]
    fn test_search_is_trimmed() {
        let f: Filters = serde_json::from_str(r#"{"search":"  math "}"#).unwrap();
        assert_eq!(f.search.as_deref(), Some("math"));
    }

    #[test]
    fn test_trimmed_string() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(deserialize_with = "deserialize_trimmed_string")]
            email: String,
        }

        let b: Body = serde_json::from_str(r#"{"email":"  Ana@Example.com "}"#).unwrap();
        assert_eq!(b.email, "Ana@Example.com");

        let missing: Result<Body, _> = serde_json::from_str("{}");
        assert!(missing.is_err());
    }

    #[test]
    fn test_invalid_uuid_is_error() {
        let result: Result<Filters, _> = serde_json::from_str(r#"{"id":"not-a-uuid"}"#);
        assert!(result.is_err());
    }
}
