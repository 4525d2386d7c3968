//! Language tags accepted by base speakers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A language a base speaker can pronounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Chinese,
}

impl Language {
    /// Short tag used for checkpoint directories (`EN`, `ZH`).
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "EN",
            Language::Chinese => "ZH",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Chinese => write!(f, "Chinese"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts ISO codes with optional region (`en`, `en-US`, `zh_CN`) and
    /// English names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        let primary = tag.split(['-', '_']).next().unwrap_or("");
        match primary {
            "en" | "eng" | "english" => Ok(Language::English),
            "zh" | "zho" | "chinese" | "mandarin" => Ok(Language::Chinese),
            _ => Err(s.trim().to_string()),
        }
    }
}
