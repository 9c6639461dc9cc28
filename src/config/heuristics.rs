use crate::utils::error::Result;
use crate::utils::validation::{
    validate_decode_labels, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DECODE_ENCODINGS: &[&str] = &[
    "utf-8",
    "shift_jis",
    "euc-jp",
    "iso-2022-jp",
    "utf-16le",
    "utf-16be",
];

fn default_decode_encodings() -> Vec<String> {
    DEFAULT_DECODE_ENCODINGS
        .iter()
        .map(|label| label.to_string())
        .collect()
}

/// 候選文字的評分門檻與抽取參數
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default)]
pub struct HeuristicsConfig {
    /// Minimum character count for a candidate to be accepted
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 100))]
    pub min_chars: usize,

    /// Minimum Japanese character ratio for a candidate to be accepted
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 0.05))]
    pub min_ratio: f64,

    /// Minimum share of kana among Japanese characters (0 disables the check)
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 0.05))]
    pub min_kana_share: f64,

    /// Ratio required by the last-resort raw decode
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 0.001))]
    pub fallback_min_ratio: f64,

    /// Lines with this many characters or fewer are dropped from decoded candidates
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 3))]
    pub min_line_chars: usize,

    /// Binary scan chunks must be longer than this to be kept
    #[cfg_attr(feature = "cli", arg(long, default_value_t = 15))]
    pub chunk_min_len: usize,

    /// Encodings tried when decoding raw document bytes
    #[cfg_attr(
        feature = "cli",
        arg(long, value_delimiter = ',', default_values_t = default_decode_encodings())
    )]
    pub decode_encodings: Vec<String>,

    /// Remove blank and repeated lines from the selected text
    #[cfg_attr(feature = "cli", arg(long))]
    pub dedupe_lines: bool,

    /// Drop everything before the first occurrence of this phrase
    #[cfg_attr(feature = "cli", arg(long))]
    pub anchor: Option<String>,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            min_chars: 100,
            min_ratio: 0.05,
            min_kana_share: 0.05,
            fallback_min_ratio: 0.001,
            min_line_chars: 3,
            chunk_min_len: 15,
            decode_encodings: default_decode_encodings(),
            dedupe_lines: false,
            anchor: None,
        }
    }
}

impl Validate for HeuristicsConfig {
    fn validate(&self) -> Result<()> {
        validate_range("heuristics.min_ratio", self.min_ratio, 0.0, 1.0)?;
        validate_range("heuristics.min_kana_share", self.min_kana_share, 0.0, 1.0)?;
        validate_range(
            "heuristics.fallback_min_ratio",
            self.fallback_min_ratio,
            0.0,
            1.0,
        )?;
        validate_positive_number("heuristics.chunk_min_len", self.chunk_min_len, 1)?;
        validate_decode_labels("heuristics.decode_encodings", &self.decode_encodings)?;
        Ok(())
    }
}
