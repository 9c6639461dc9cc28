use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};

/// 常見於亂碼行的字元
pub const DEFAULT_GARBLED_CHARS: &str = "龠〆〜耐脀砐源氈鰈璀丄溑蛝鯄瀠鮤";

fn default_garbled_chars() -> String {
    DEFAULT_GARBLED_CHARS.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// Strip markup and noise, keep readable lines, drop duplicates
    Basic,
    /// Keep Japanese lines that contain no garble markers
    Garbled,
    /// Join surviving lines into paragraphs
    Paragraph,
    /// Paragraph mode with stricter garble detection
    Strict,
    /// Only remove non-text characters and tags
    Noise,
    /// Leave the text unchanged
    Passthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[serde(default)]
pub struct CleanConfig {
    /// Cleaning pass applied to the extracted text
    #[cfg_attr(feature = "cli", arg(long = "clean", value_enum))]
    pub mode: Option<CleanMode>,

    /// Characters that mark a line as garbled
    #[cfg_attr(feature = "cli", arg(long, default_value_t = default_garbled_chars()))]
    pub garbled_chars: String,

    /// Keep text up to and including this phrase, drop the rest
    #[cfg_attr(feature = "cli", arg(long))]
    pub truncate_after: Option<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            mode: None,
            garbled_chars: default_garbled_chars(),
            truncate_after: None,
        }
    }
}

impl CleanConfig {
    pub fn with_mode(mode: CleanMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mode.is_some() || self.truncate_after.is_some()
    }
}

impl Validate for CleanConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("cleaning.garbled_chars", &self.garbled_chars)?;
        if let Some(marker) = &self.truncate_after {
            validate_non_empty_string("cleaning.truncate_after", marker)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_deserializes_lowercase() {
        let config: CleanConfig = toml::from_str("mode = \"strict\"").unwrap();
        assert_eq!(config.mode, Some(CleanMode::Strict));
        assert_eq!(config.garbled_chars, DEFAULT_GARBLED_CHARS);
        assert!(config.is_enabled());
    }

    #[test]
    fn test_disabled_by_default() {
        let config = CleanConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }
}
