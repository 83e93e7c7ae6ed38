//! KOL outreach record and its export presets.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fmt::{EnumLocale, SpecLabelTable};
use crate::mapper::{EnumColumnKind, SpecExportColumn, SpecLabelCatalog};
use crate::record::{EnumFieldValue, Record};

/// Label table of [`EnumKolStatus`] values.
pub const C_TABLE_STATUS: &str = "status";
/// Label table of [`EnumContentCategory`] values.
pub const C_TABLE_CONTENT_CATEGORY: &str = "content_category";
/// Default worksheet name.
pub const C_SHEET_NAME_KOL: &str = "KOL";

////////////////////////////////////////////////////////////////////////////////
// #region Model

/// Outreach pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumKolStatus {
    New,
    Contacted,
    Replied,
    Negotiating,
    Cooperating,
    Cooperated,
    Rejected,
}

impl EnumKolStatus {
    /// Every status, in pipeline order.
    pub const ALL: [EnumKolStatus; 7] = [
        Self::New,
        Self::Contacted,
        Self::Replied,
        Self::Negotiating,
        Self::Cooperating,
        Self::Cooperated,
        Self::Rejected,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Replied => "replied",
            Self::Negotiating => "negotiating",
            Self::Cooperating => "cooperating",
            Self::Cooperated => "cooperated",
            Self::Rejected => "rejected",
        }
    }
}

/// Content focus assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumContentCategory {
    ContractTrading,
    CryptoTrading,
    Web3,
    Unknown,
}

impl EnumContentCategory {
    /// Every category.
    pub const ALL: [EnumContentCategory; 4] = [
        Self::ContractTrading,
        Self::CryptoTrading,
        Self::Web3,
        Self::Unknown,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContractTrading => "contract_trading",
            Self::CryptoTrading => "crypto_trading",
            Self::Web3 => "web3",
            Self::Unknown => "unknown",
        }
    }
}

/// A tracked social-media account, as served by the outreach API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kol {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub twitter_id: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub profile_img_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub last_tweet_date: Option<String>,
    #[serde(default)]
    pub account_created: Option<String>,
    #[serde(default)]
    pub quality_score: f64,
    pub content_category: EnumContentCategory,
    pub status: EnumKolStatus,
    #[serde(default)]
    pub custom_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn derive_optional_text(value: &Option<String>) -> EnumFieldValue<'_> {
    value
        .as_deref()
        .map_or(EnumFieldValue::Missing, |s| EnumFieldValue::Text(Cow::Borrowed(s)))
}

impl Record for Kol {
    /// Keys are the camelCase JSON field names.
    fn field(&self, key: &str) -> EnumFieldValue<'_> {
        match key {
            "id" => EnumFieldValue::Integer(self.id),
            "username" => EnumFieldValue::Text(Cow::Borrowed(self.username.as_str())),
            "displayName" => EnumFieldValue::Text(Cow::Borrowed(self.display_name.as_str())),
            "twitterId" => derive_optional_text(&self.twitter_id),
            "bio" => derive_optional_text(&self.bio),
            "followerCount" => EnumFieldValue::Integer(self.follower_count),
            "followingCount" => EnumFieldValue::Integer(self.following_count),
            "verified" => EnumFieldValue::Flag(self.verified),
            "profileImgUrl" => derive_optional_text(&self.profile_img_url),
            "language" => derive_optional_text(&self.language),
            "lastTweetDate" => derive_optional_text(&self.last_tweet_date),
            "accountCreated" => derive_optional_text(&self.account_created),
            "qualityScore" => EnumFieldValue::Number(self.quality_score),
            "contentCategory" => {
                EnumFieldValue::Text(Cow::Borrowed(self.content_category.as_str()))
            }
            "status" => EnumFieldValue::Text(Cow::Borrowed(self.status.as_str())),
            "customNotes" => derive_optional_text(&self.custom_notes),
            "createdAt" => EnumFieldValue::Timestamp(self.created_at),
            "updatedAt" => EnumFieldValue::Timestamp(self.updated_at),
            _ => EnumFieldValue::Missing,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

fn derive_status_label(status: EnumKolStatus, locale: EnumLocale) -> &'static str {
    use EnumKolStatus as S;
    match locale {
        EnumLocale::ZhCn => match status {
            S::New => "新添加",
            S::Contacted => "已联系",
            S::Replied => "已回复",
            S::Negotiating => "协商中",
            S::Cooperating => "合作中",
            S::Cooperated => "已合作",
            S::Rejected => "已拒绝",
        },
        EnumLocale::EnUs => match status {
            S::New => "New",
            S::Contacted => "Contacted",
            S::Replied => "Replied",
            S::Negotiating => "Negotiating",
            S::Cooperating => "Cooperating",
            S::Cooperated => "Cooperated",
            S::Rejected => "Rejected",
        },
        EnumLocale::DeDe => match status {
            S::New => "Neu",
            S::Contacted => "Kontaktiert",
            S::Replied => "Geantwortet",
            S::Negotiating => "In Verhandlung",
            S::Cooperating => "In Kooperation",
            S::Cooperated => "Kooperiert",
            S::Rejected => "Abgelehnt",
        },
    }
}

fn derive_category_label(category: EnumContentCategory, locale: EnumLocale) -> &'static str {
    use EnumContentCategory as C;
    match locale {
        EnumLocale::ZhCn => match category {
            C::ContractTrading => "合约交易分析",
            C::CryptoTrading => "代币交易分析",
            C::Web3 => "Web3 通用",
            C::Unknown => "未分类",
        },
        EnumLocale::EnUs => match category {
            C::ContractTrading => "Contract Trading Analysis",
            C::CryptoTrading => "Token Trading Analysis",
            C::Web3 => "Web3 General",
            C::Unknown => "Uncategorized",
        },
        EnumLocale::DeDe => match category {
            C::ContractTrading => "Kontrakthandel-Analyse",
            C::CryptoTrading => "Token-Handel-Analyse",
            C::Web3 => "Web3 allgemein",
            C::Unknown => "Nicht kategorisiert",
        },
    }
}

/// `status` and `content_category` label tables for `locale`.
pub fn derive_kol_label_catalog(locale: EnumLocale) -> SpecLabelCatalog {
    SpecLabelCatalog::new()
        .with_table(SpecLabelTable::new(
            C_TABLE_STATUS,
            EnumKolStatus::ALL
                .into_iter()
                .map(|s| (s.as_str(), derive_status_label(s, locale))),
        ))
        .with_table(SpecLabelTable::new(
            C_TABLE_CONTENT_CATEGORY,
            EnumContentCategory::ALL
                .into_iter()
                .map(|c| (c.as_str(), derive_category_label(c, locale))),
        ))
}

/// The seventeen KOL export columns, labelled for `locale`.
pub fn derive_kol_columns(locale: EnumLocale) -> Vec<SpecExportColumn> {
    use EnumColumnKind as K;

    let label_status = || K::Label {
        table: C_TABLE_STATUS.to_string(),
    };
    let label_category = || K::Label {
        table: C_TABLE_CONTENT_CATEGORY.to_string(),
    };

    // (key, width, kind, en-US, zh-CN, de-DE)
    let l_rows: [(&str, u16, EnumColumnKind, &str, &str, &str); 17] = [
        ("username", 20, K::Text, "Username", "用户名", "Benutzername"),
        ("displayName", 24, K::Text, "Display Name", "显示名称", "Anzeigename"),
        ("followerCount", 12, K::Count, "Followers", "粉丝数", "Follower"),
        ("followingCount", 12, K::Count, "Following", "关注数", "Folgt"),
        ("status", 12, label_status(), "Status", "状态", "Status"),
        ("contentCategory", 18, label_category(), "Content Category", "内容分类", "Inhaltskategorie"),
        ("qualityScore", 10, K::Number, "Quality Score", "质量分", "Qualitätswert"),
        ("verified", 8, K::Flag, "Verified", "是否认证", "Verifiziert"),
        ("language", 8, K::OptionalText, "Language", "语言", "Sprache"),
        ("bio", 48, K::OptionalText, "Bio", "个人简介", "Bio"),
        ("twitterId", 20, K::OptionalText, "Twitter ID", "Twitter ID", "Twitter-ID"),
        ("profileImgUrl", 40, K::OptionalText, "Avatar URL", "头像 URL", "Avatar-URL"),
        ("lastTweetDate", 20, K::OptionalText, "Last Tweet Date", "最后推文日期", "Letzter Tweet"),
        ("accountCreated", 20, K::OptionalText, "Account Created", "账号创建日期", "Konto erstellt"),
        ("customNotes", 32, K::OptionalText, "Notes", "备注", "Notizen"),
        ("createdAt", 20, K::Timestamp, "Created At", "创建时间", "Erstellt am"),
        ("updatedAt", 20, K::Timestamp, "Updated At", "更新时间", "Aktualisiert am"),
    ];

    l_rows
        .into_iter()
        .map(|(c_key, n_width, kind, c_en, c_zh, c_de)| {
            let c_label = match locale {
                EnumLocale::EnUs => c_en,
                EnumLocale::ZhCn => c_zh,
                EnumLocale::DeDe => c_de,
            };
            SpecExportColumn::new(c_label, n_width, c_key, kind)
        })
        .collect()
}

/// File name prefix for `locale`.
pub fn derive_kol_filename_prefix(locale: EnumLocale) -> &'static str {
    match locale {
        EnumLocale::ZhCn => "KOL导出",
        EnumLocale::EnUs | EnumLocale::DeDe => "kol_export",
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::fmt::SpecFormatContext;
    use crate::mapper::{SpecMapContext, map_record, validate_columns};

    fn derive_kol() -> Kol {
        Kol {
            id: 1,
            username: "bob".to_string(),
            display_name: "Bob".to_string(),
            twitter_id: Some("42".to_string()),
            bio: Some("hi, there".to_string()),
            follower_count: 2_500_000,
            following_count: 12,
            verified: true,
            profile_img_url: None,
            language: Some("en".to_string()),
            last_tweet_date: Some("2024-01-04".to_string()),
            account_created: None,
            quality_score: 85.0,
            content_category: EnumContentCategory::Web3,
            status: EnumKolStatus::Contacted,
            custom_notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 7).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 6, 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_kol_columns_are_valid_for_every_locale() {
        for locale in EnumLocale::ALL {
            let columns = derive_kol_columns(locale);
            assert_eq!(columns.len(), 17);
            validate_columns(&columns, &derive_kol_label_catalog(locale)).unwrap();
        }
    }

    #[test]
    fn test_kol_columns_zh_cn_labels_in_order() {
        let l_labels: Vec<String> = derive_kol_columns(EnumLocale::ZhCn)
            .into_iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(
            l_labels,
            vec![
                "用户名", "显示名称", "粉丝数", "关注数", "状态", "内容分类", "质量分",
                "是否认证", "语言", "个人简介", "Twitter ID", "头像 URL", "最后推文日期",
                "账号创建日期", "备注", "创建时间", "更新时间",
            ]
        );
    }

    #[test]
    fn test_map_kol_zh_cn() {
        let locale = EnumLocale::ZhCn;
        let context = SpecMapContext {
            format: SpecFormatContext::new(locale),
            catalog: derive_kol_label_catalog(locale),
        };
        let row = map_record(&derive_kol(), &derive_kol_columns(locale), &context).unwrap();
        assert_eq!(
            row.cells,
            vec![
                "bob",
                "Bob",
                "2,500,000",
                "12",
                "已联系",
                "Web3 通用",
                "85",
                "是",
                "en",
                "hi, there",
                "42",
                "",
                "2024-01-04",
                "",
                "",
                "2024/1/5 22:03:07",
                "2024/1/6 09:00:00",
            ]
        );
    }

    #[test]
    fn test_kol_deserializes_from_api_json() {
        let kol: Kol = serde_json::from_value(serde_json::json!({
            "id": 7,
            "username": "alice",
            "displayName": "Alice",
            "followerCount": 1000,
            "followingCount": 3,
            "verified": false,
            "qualityScore": 72.5,
            "contentCategory": "contract_trading",
            "status": "new",
            "createdAt": "2024-01-05T14:03:07.000Z",
            "updatedAt": "2024-01-05T14:03:07.000Z"
        }))
        .unwrap();
        assert_eq!(kol.status, EnumKolStatus::New);
        assert_eq!(kol.content_category, EnumContentCategory::ContractTrading);
        assert!(kol.field("bio").is_missing());
        assert_eq!(kol.field("followerCount"), EnumFieldValue::Integer(1000));
    }

    #[test]
    fn test_filename_prefix() {
        assert_eq!(derive_kol_filename_prefix(EnumLocale::ZhCn), "KOL导出");
        assert_eq!(derive_kol_filename_prefix(EnumLocale::EnUs), "kol_export");
    }
}
