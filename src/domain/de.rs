//! Internal serde helpers for fields the backend does not type consistently.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(i64),
    Float(f64),
    Str(String),
}

/// Accept Option<i64> from either a number or a string like "212"; null/"" -> None.
pub fn opt_i64_from_str_or_num<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<NumOrStr> = Option::deserialize(deserializer)?;
    Ok(match val {
        None => None,
        Some(NumOrStr::Num(n)) => Some(n),
        Some(NumOrStr::Float(f)) => Some(f as i64),
        Some(NumOrStr::Str(s)) => s.trim().parse::<i64>().ok(),
    })
}

/// Counters come back as numbers, numeric strings or null depending on the route.
pub fn u64_lenient<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let val = opt_i64_from_str_or_num(deserializer)?;
    Ok(val.map(|n| n.max(0) as u64).unwrap_or(0))
}

/// A `{label: count}` map whose counts may be numbers, numeric strings or null.
pub fn counts_lenient<'de, D>(deserializer: D) -> Result<HashMap<String, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Count(#[serde(deserialize_with = "u64_lenient")] u64);

    let val: Option<HashMap<String, Count>> = Option::deserialize(deserializer)?;
    Ok(val
        .unwrap_or_default()
        .into_iter()
        .map(|(label, Count(n))| (label, n))
        .collect())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "super::opt_i64_from_str_or_num", default)]
        pages: Option<i64>,
        #[serde(deserialize_with = "super::u64_lenient", default)]
        count: u64,
    }

    #[test]
    fn accepts_numbers_strings_and_null() {
        let p: Probe = serde_json::from_str(r#"{ "pages": "212", "count": 7 }"#).unwrap();
        assert_eq!(p.pages, Some(212));
        assert_eq!(p.count, 7);

        let p: Probe = serde_json::from_value(serde_json::json!({ "pages": null, "count": "3" })).unwrap();
        assert_eq!(p.pages, None);
        assert_eq!(p.count, 3);

        let p: Probe = serde_json::from_str(r#"{ "pages": " " }"#).unwrap();
        assert_eq!(p.pages, None);
        assert_eq!(p.count, 0);
    }

    #[test]
    fn count_maps_accept_mixed_values() {
        #[derive(Deserialize)]
        struct ByType {
            #[serde(deserialize_with = "super::counts_lenient", default)]
            counts: std::collections::HashMap<String, u64>,
        }

        let b: ByType =
            serde_json::from_str(r#"{ "counts": { "user": "12", "admin": 3, "other": null } }"#)
                .unwrap();
        assert_eq!(b.counts["user"], 12);
        assert_eq!(b.counts["admin"], 3);
        assert_eq!(b.counts["other"], 0);

        let b: ByType = serde_json::from_str(r#"{ "counts": null }"#).unwrap();
        assert!(b.counts.is_empty());
    }
}
