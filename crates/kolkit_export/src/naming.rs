//! Export file naming.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

static REGEX_TIMESTAMP_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:.]").expect("Invalid timestamp punctuation regex"));

const N_LEN_TIMESTAMP_SECONDS: usize = 19;

/// Filesystem-safe UTC timestamp truncated to whole seconds,
/// e.g. `2024-01-05T14-03-07`.
pub fn derive_filename_timestamp(now: &DateTime<Utc>) -> String {
    let c_iso = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    REGEX_TIMESTAMP_PUNCT
        .replace_all(&c_iso, "-")
        .chars()
        .take(N_LEN_TIMESTAMP_SECONDS)
        .collect()
}

/// `<prefix>_<timestamp>.<extension>`.
pub fn derive_export_filename(prefix: &str, extension: &str, now: &DateTime<Utc>) -> String {
    format!(
        "{prefix}_{}.{}",
        derive_filename_timestamp(now),
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_derive_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 7).unwrap()
            + chrono::Duration::milliseconds(456);
        assert_eq!(
            derive_export_filename("kol_export", "xlsx", &now),
            "kol_export_2024-01-05T14-03-07.xlsx"
        );
        assert_eq!(
            derive_export_filename("KOL导出", ".csv", &now),
            "KOL导出_2024-01-05T14-03-07.csv"
        );
    }

    #[test]
    fn test_timestamp_has_no_reserved_punctuation() {
        let c_ts = derive_filename_timestamp(&Utc::now());
        assert_eq!(c_ts.len(), 19);
        assert!(!c_ts.contains(':') && !c_ts.contains('.'));
    }
}
