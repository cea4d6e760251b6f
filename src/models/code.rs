use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::codes::{CODE_ALPHABET, CODE_LENGTH};
use crate::entities::promotional_codes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionalCode {
    pub id: i32,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<promotional_codes::Model> for PromotionalCode {
    fn from(model: promotional_codes::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            created_at: model.created_at,
            is_used: model.is_used,
            used_at: model.used_at,
        }
    }
}

/// Result of an attempt to redeem a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    NotFound,
    AlreadyUsed(PromotionalCode),
    Redeemed(PromotionalCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Used,
    Unused,
}

impl CodeStatus {
    /// Empty input means "no status filter".
    pub fn parse_filter(raw: &str) -> Result<Option<Self>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl FromStr for CodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "used" => Ok(Self::Used),
            "unused" => Ok(Self::Unused),
            other => Err(format!(
                "Invalid status filter: '{other}'. Expected 'used' or 'unused'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSort {
    CreatedAsc,
    #[default]
    CreatedDesc,
    CodeAsc,
    CodeDesc,
}

impl FromStr for CodeSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "created_desc" => Ok(Self::CreatedDesc),
            "created_asc" => Ok(Self::CreatedAsc),
            "code_asc" => Ok(Self::CodeAsc),
            "code_desc" => Ok(Self::CodeDesc),
            other => Err(format!(
                "Invalid sort order: '{other}'. Expected created_asc, created_desc, code_asc or code_desc"
            )),
        }
    }
}

impl fmt::Display for CodeSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreatedAsc => "created_asc",
            Self::CreatedDesc => "created_desc",
            Self::CodeAsc => "code_asc",
            Self::CodeDesc => "code_desc",
        };
        f.write_str(s)
    }
}

/// Listing query. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFilter {
    pub page: u64,
    pub page_size: u64,
    pub search: Option<String>,
    pub status: Option<CodeStatus>,
    pub sort: CodeSort,
}

impl Default for CodeFilter {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            status: None,
            sort: CodeSort::default(),
        }
    }
}

impl CodeFilter {
    /// Rows skipped before this page, or `None` when it does not fit a
    /// SQLite `OFFSET` (a signed 64-bit integer).
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.page
            .checked_sub(1)?
            .checked_mul(self.page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }
}

#[derive(Debug, Clone)]
pub struct CodePage {
    pub codes: Vec<PromotionalCode>,
    /// Rows matching the filter before pagination.
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeStats {
    pub total: u64,
    pub used: u64,
    pub unused: u64,
}

impl CodeStats {
    /// Whole-number percentage of used codes.
    #[must_use]
    pub fn usage_rate(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.used * 100 + self.total / 2) / self.total
    }
}

/// Draws a fresh code, each character uniformly from `[A-Z0-9]`.
#[must_use]
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect()
}

#[must_use]
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_use_alphabet() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), 8);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "unexpected character in {code}"
            );
            assert!(is_well_formed(&code));
        }
    }

    #[test]
    fn test_generated_codes_vary() {
        let a = generate_code();
        let b = generate_code();
        let c = generate_code();
        assert!(a != b || b != c);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("K3F9QZ1B"));
        assert!(!is_well_formed("k3f9qz1b"));
        assert!(!is_well_formed("K3F9QZ1"));
        assert!(!is_well_formed("K3F9QZ1B0"));
        assert!(!is_well_formed("K3F9-Z1B"));
    }

    #[test]
    fn test_parse_status_filter() {
        assert_eq!(CodeStatus::parse_filter(""), Ok(None));
        assert_eq!(CodeStatus::parse_filter("used"), Ok(Some(CodeStatus::Used)));
        assert_eq!(
            CodeStatus::parse_filter("unused"),
            Ok(Some(CodeStatus::Unused))
        );
        assert!(CodeStatus::parse_filter("maybe").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("".parse::<CodeSort>(), Ok(CodeSort::CreatedDesc));
        assert_eq!("created_asc".parse::<CodeSort>(), Ok(CodeSort::CreatedAsc));
        assert_eq!("code_desc".parse::<CodeSort>(), Ok(CodeSort::CodeDesc));
        assert!("newest".parse::<CodeSort>().is_err());
        assert_eq!(CodeSort::CodeAsc.to_string(), "code_asc");
    }

    #[test]
    fn test_filter_offset() {
        let filter = |page, page_size| CodeFilter {
            page,
            page_size,
            ..CodeFilter::default()
        };

        assert_eq!(filter(1, 10).offset(), Some(0));
        assert_eq!(filter(3, 20).offset(), Some(40));
        assert_eq!(filter(0, 10).offset(), None);
        assert_eq!(filter(u64::MAX, 100).offset(), None);
        assert_eq!(filter(u64::MAX / 2, 2).offset(), None);
    }

    #[test]
    fn test_usage_rate() {
        let empty = CodeStats {
            total: 0,
            used: 0,
            unused: 0,
        };
        assert_eq!(empty.usage_rate(), 0);

        let third = CodeStats {
            total: 3,
            used: 1,
            unused: 2,
        };
        assert_eq!(third.usage_rate(), 33);

        let two_thirds = CodeStats {
            total: 3,
            used: 2,
            unused: 1,
        };
        assert_eq!(two_thirds.usage_rate(), 67);
    }
}
