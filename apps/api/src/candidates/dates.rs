//! Tolerant date parsing for form input and model output.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Accepts `YYYY-MM-DD` (optionally followed by a time part), `YYYY-MM`,
/// `MM/YYYY` and `YYYY`. Partial dates resolve to the first day of the period.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let day_part = raw.get(..10).unwrap_or(raw);
    if let Ok(date) = NaiveDate::parse_from_str(day_part, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if let Some((month, year)) = raw.split_once('/') {
        let month: u32 = month.trim().parse().ok()?;
        let year: i32 = year.trim().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }
    if raw.len() == 4 {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// Serde helper: empty strings and nulls become `None`; anything else must parse.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_loose_date(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{value}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_formats() {
        assert_eq!(parse_loose_date("2021-06-15"), Some(ymd(2021, 6, 15)));
        assert_eq!(parse_loose_date("2021-06-15T00:00:00.000Z"), Some(ymd(2021, 6, 15)));
        assert_eq!(parse_loose_date("2021-06"), Some(ymd(2021, 6, 1)));
        assert_eq!(parse_loose_date("2019"), Some(ymd(2019, 1, 1)));
        assert_eq!(parse_loose_date("07/2022"), Some(ymd(2022, 7, 1)));
    }

    #[test]
    fn test_rejects_free_text() {
        assert_eq!(parse_loose_date("Present"), None);
        assert_eq!(parse_loose_date(""), None);
        assert_eq!(parse_loose_date("2021-13"), None);
    }

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "optional_date")]
        start: Option<NaiveDate>,
    }

    #[test]
    fn test_serde_helper() {
        let form: Form = serde_json::from_str(r#"{"start": ""}"#).unwrap();
        assert_eq!(form.start, None);
        let form: Form = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(form.start, None);
        let form: Form = serde_json::from_str(r#"{"start": "2020-02"}"#).unwrap();
        assert_eq!(form.start, Some(ymd(2020, 2, 1)));
        assert!(serde_json::from_str::<Form>(r#"{"start": "soon"}"#).is_err());
    }
}
