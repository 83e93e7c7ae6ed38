//! Locale-aware field formatting.
//!
//! Every function here is total over its inputs except the ones returning
//! [`Result`]: those reject malformed data instead of rendering a blank.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

const N_SECS_PER_MINUTE: i32 = 60;
const N_FLOAT_INTEGRAL_MAX: f64 = 1e15;

////////////////////////////////////////////////////////////////////////////////
// #region Locale

/// Display locale for counts, flags and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnumLocale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "de-DE")]
    DeDe,
}

impl EnumLocale {
    /// Every supported locale.
    pub const ALL: [EnumLocale; 3] = [EnumLocale::EnUs, EnumLocale::ZhCn, EnumLocale::DeDe];

    /// BCP-47 tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhCn => "zh-CN",
            Self::DeDe => "de-DE",
        }
    }

    /// Digit group separator for counts.
    pub fn thousands_separator(self) -> char {
        match self {
            Self::EnUs | Self::ZhCn => ',',
            Self::DeDe => '.',
        }
    }

    /// Offset used when a caller does not configure one.
    pub fn default_utc_offset_minutes(self) -> i32 {
        match self {
            Self::ZhCn => 8 * 60,
            Self::EnUs | Self::DeDe => 0,
        }
    }
}

impl fmt::Display for EnumLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumLocale {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        let c_tag = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|locale| locale.as_str().eq_ignore_ascii_case(&c_tag))
            .ok_or_else(|| {
                ExportError::config(format!(
                    "unsupported locale {s:?}, expected one of en-US, zh-CN, de-DE"
                ))
            })
    }
}

/// Locale plus the UTC offset timestamps are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFormatContext {
    pub locale: EnumLocale,
    pub utc_offset: FixedOffset,
}

impl SpecFormatContext {
    /// Context with the locale's default offset.
    pub fn new(locale: EnumLocale) -> Self {
        let utc_offset = FixedOffset::east_opt(locale.default_utc_offset_minutes() * N_SECS_PER_MINUTE)
            .unwrap_or_else(|| Utc.fix());
        Self { locale, utc_offset }
    }

    /// Override the UTC offset; fails outside chrono's `FixedOffset` range.
    pub fn with_utc_offset_minutes(mut self, n_minutes: i32) -> Result<Self> {
        self.utc_offset = n_minutes
            .checked_mul(N_SECS_PER_MINUTE)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ExportError::config(format!("utc offset out of range: {n_minutes} minutes"))
            })?;
        Ok(self)
    }
}

impl Default for SpecFormatContext {
    fn default() -> Self {
        Self::new(EnumLocale::default())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Numbers

/// Render an integer count with the locale's thousands separator.
pub fn format_count(n: i64, locale: EnumLocale) -> String {
    let c_digits = n.unsigned_abs().to_string();
    let c_sep = locale.thousands_separator();
    let n_len = c_digits.len();

    let mut c_out = String::with_capacity(n_len + n_len / 3 + 1);
    if n < 0 {
        c_out.push('-');
    }
    for (n_idx, c_digit) in c_digits.chars().enumerate() {
        if n_idx > 0 && (n_len - n_idx) % 3 == 0 {
            c_out.push(c_sep);
        }
        c_out.push(c_digit);
    }
    c_out
}

/// Render a score: integral values without a fraction, others in shortest form.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < N_FLOAT_INTEGRAL_MAX {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Render a boolean as the locale's yes/no word.
pub fn format_flag(value: bool, locale: EnumLocale) -> &'static str {
    match (locale, value) {
        (EnumLocale::EnUs, true) => "Yes",
        (EnumLocale::EnUs, false) => "No",
        (EnumLocale::ZhCn, true) => "是",
        (EnumLocale::ZhCn, false) => "否",
        (EnumLocale::DeDe, true) => "Ja",
        (EnumLocale::DeDe, false) => "Nein",
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Timestamps

/// Render `ts` as a locale date-time in the context's UTC offset.
pub fn format_timestamp(ts: &DateTime<Utc>, ctx: &SpecFormatContext) -> String {
    let ts_local = ts.with_timezone(&ctx.utc_offset);
    let c_pattern = match ctx.locale {
        EnumLocale::EnUs => "%-m/%-d/%Y, %-I:%M:%S %p",
        EnumLocale::ZhCn => "%Y/%-m/%-d %H:%M:%S",
        EnumLocale::DeDe => "%-d.%-m.%Y, %H:%M:%S",
    };
    ts_local.format(c_pattern).to_string()
}

/// Parse RFC 3339, naive ISO date-times (as UTC) or plain dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let c_raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(c_raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for c_pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(c_raw, c_pattern) {
            return Ok(ts.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(c_raw, "%Y-%m-%d")
        && let Some(ts) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(ts.and_utc());
    }

    Err(ExportError::invalid_timestamp(raw))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Labels

/// Named value → label mapping for one enumerated field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecLabelTable {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl SpecLabelTable {
    /// Table `name` from `(value, label)` pairs.
    pub fn new<I, K, V>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Overlay `overrides` onto this table; existing keys are replaced.
    pub fn merge(&mut self, overrides: &BTreeMap<String, String>) {
        for (c_key, c_label) in overrides {
            self.labels.insert(c_key.clone(), c_label.clone());
        }
    }
}

/// Map an enumerated value to its label; absent values are an error.
pub fn lookup_label<'a>(value: &str, table: &'a SpecLabelTable) -> Result<&'a str> {
    table
        .labels
        .get(value)
        .map(String::as_str)
        .ok_or_else(|| ExportError::unknown_label(&table.name, value))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts_sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 7).unwrap()
    }

    #[test]
    fn test_format_count_groups_digits() {
        assert_eq!(format_count(0, EnumLocale::EnUs), "0");
        assert_eq!(format_count(999, EnumLocale::EnUs), "999");
        assert_eq!(format_count(1_000, EnumLocale::EnUs), "1,000");
        assert_eq!(format_count(1_234_567, EnumLocale::ZhCn), "1,234,567");
        assert_eq!(format_count(2_500_000, EnumLocale::DeDe), "2.500.000");
        assert_eq!(format_count(-1_234, EnumLocale::EnUs), "-1,234");
    }

    #[test]
    fn test_format_count_extremes_do_not_panic() {
        assert_eq!(
            format_count(i64::MIN, EnumLocale::EnUs),
            "-9,223,372,036,854,775,808"
        );
        assert_eq!(
            format_count(i64::MAX, EnumLocale::EnUs),
            "9,223,372,036,854,775,807"
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(85.0), "85");
        assert_eq!(format_number(72.5), "72.5");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(f64::NAN), "");
        assert_eq!(format_number(f64::INFINITY), "");
    }

    #[test]
    fn test_format_flag_per_locale() {
        assert_eq!(format_flag(true, EnumLocale::EnUs), "Yes");
        assert_eq!(format_flag(false, EnumLocale::ZhCn), "否");
        assert_eq!(format_flag(true, EnumLocale::DeDe), "Ja");
    }

    #[test]
    fn test_format_timestamp_per_locale() {
        let ts = ts_sample();
        let ctx_utc = |locale| {
            SpecFormatContext::new(locale)
                .with_utc_offset_minutes(0)
                .unwrap()
        };
        assert_eq!(
            format_timestamp(&ts, &ctx_utc(EnumLocale::EnUs)),
            "1/5/2024, 2:03:07 PM"
        );
        assert_eq!(
            format_timestamp(&ts, &ctx_utc(EnumLocale::ZhCn)),
            "2024/1/5 14:03:07"
        );
        assert_eq!(
            format_timestamp(&ts, &ctx_utc(EnumLocale::DeDe)),
            "5.1.2024, 14:03:07"
        );
    }

    #[test]
    fn test_format_timestamp_applies_offset() {
        let ctx = SpecFormatContext::new(EnumLocale::ZhCn);
        assert_eq!(format_timestamp(&ts_sample(), &ctx), "2024/1/5 22:03:07");

        let ts_late = Utc.with_ymd_and_hms(2024, 1, 5, 20, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts_late, &ctx), "2024/1/6 04:00:00");
    }

    #[test]
    fn test_with_utc_offset_rejects_out_of_range() {
        assert!(
            SpecFormatContext::default()
                .with_utc_offset_minutes(24 * 60)
                .is_err()
        );
        assert!(
            SpecFormatContext::default()
                .with_utc_offset_minutes(-300)
                .is_ok()
        );
    }

    #[test]
    fn test_parse_timestamp_accepts_common_forms() {
        let ts = ts_sample();
        assert_eq!(parse_timestamp("2024-01-05T14:03:07.000Z").unwrap(), ts);
        assert_eq!(parse_timestamp("2024-01-05T22:03:07+08:00").unwrap(), ts);
        assert_eq!(parse_timestamp("2024-01-05T14:03:07").unwrap(), ts);
        assert_eq!(parse_timestamp("2024-01-05 14:03:07.5").unwrap().timestamp(), ts.timestamp());
        assert_eq!(
            parse_timestamp("2024-01-05").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        for c_raw in ["", "yesterday", "2024-13-01", "05/01/2024"] {
            assert!(
                matches!(parse_timestamp(c_raw), Err(ExportError::InvalidTimestamp { .. })),
                "{c_raw:?}"
            );
        }
    }

    #[test]
    fn test_lookup_label() {
        let table = SpecLabelTable::new("status", [("new", "New"), ("contacted", "Contacted")]);
        assert_eq!(lookup_label("new", &table).unwrap(), "New");

        let err = lookup_label("archived", &table).unwrap_err();
        assert!(matches!(
            err,
            ExportError::UnknownLabel { ref table, ref value, .. } if table == "status" && value == "archived"
        ));
    }

    #[test]
    fn test_label_table_merge_overrides() {
        let mut table = SpecLabelTable::new("status", [("new", "New")]);
        let overrides = BTreeMap::from([
            ("new".to_string(), "Fresh".to_string()),
            ("rejected".to_string(), "Declined".to_string()),
        ]);
        table.merge(&overrides);
        assert_eq!(table.labels["new"], "Fresh");
        assert_eq!(table.labels["rejected"], "Declined");
    }

    #[test]
    fn test_locale_parse_and_serde_names() {
        assert_eq!("zh-CN".parse::<EnumLocale>().unwrap(), EnumLocale::ZhCn);
        assert_eq!("de_de".parse::<EnumLocale>().unwrap(), EnumLocale::DeDe);
        assert!("fr-FR".parse::<EnumLocale>().is_err());
        assert_eq!(
            serde_json::to_string(&EnumLocale::ZhCn).unwrap(),
            "\"zh-CN\""
        );
    }
}
