//! 轉出文字的規則式清理
//!
//! 每種模式都是逐行判斷；可選的 `truncate_after` 在最後套用。

use crate::config::clean::{CleanConfig, CleanMode};
use crate::core::script::contains_native;
use crate::core::text::{remove_noise, split_lines, strip_all_control, strip_control, strip_tags};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

static XML_DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>").expect("xml declaration pattern is valid"));

static MARKUP_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z0-9:]+[^>]*>").expect("tag pattern is valid"));

static ALNUM_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{3,}").expect("alnum pattern is valid"));

const MEANINGFUL_SYMBOLS: &str = "・。、：；「」『』（）［］【】◆■□◇※！？";

static MEANINGFUL_SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[{}]", MEANINGFUL_SYMBOLS)).expect("symbol pattern is valid")
});

static MEANINGFUL_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[A-Za-z0-9]{{2,}}|[{}]", MEANINGFUL_SYMBOLS))
        .expect("meaningful text pattern is valid")
});

// 段落模式允許的字元：假名、長音、漢字、英數、全形英數與常用標點
const ALLOWED_CHARS: &str = r"ぁ-んァ-ヶー一-龥々A-Za-z0-9０-９Ａ-Ｚａ-ｚ \t.,;:!?()（）「」『』［］【】・。、：；！？…　";

static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[^{}]", ALLOWED_CHARS)).expect("allowed set pattern is valid")
});

static DISALLOWED_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("[^{}]{{4,}}", ALLOWED_CHARS)).expect("allowed set pattern is valid")
});

static MARKUP_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[<>/\\{}\[\]|@#$%^&*=+`~]{4,}").expect("markup run pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanOutcome {
    pub text: String,
    pub lines_before: usize,
    pub lines_after: usize,
}

#[derive(Debug, Clone)]
pub struct TextCleaner {
    mode: Option<CleanMode>,
    truncate_after: Option<String>,
    garbled_any: Regex,
    garbled_pair: Regex,
    garbled_triple: Regex,
}

impl TextCleaner {
    pub fn new(config: &CleanConfig) -> Result<Self> {
        let class = format!("[{}]", regex::escape(&config.garbled_chars));
        let build = |pattern: String| {
            Regex::new(&pattern).map_err(|e| EtlError::InvalidConfigValueError {
                field: "cleaning.garbled_chars".to_string(),
                value: config.garbled_chars.clone(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            mode: config.mode,
            truncate_after: config.truncate_after.clone(),
            garbled_any: build(class.clone())?,
            garbled_pair: build(format!("{}{{2,}}", class))?,
            garbled_triple: build(format!("{}{{3,}}", class))?,
        })
    }

    pub fn clean(&self, text: &str) -> CleanOutcome {
        let lines_before = split_lines(text).len();

        let mut cleaned = match self.mode {
            Some(CleanMode::Basic) => self.basic(text),
            Some(CleanMode::Garbled) => self.garbled(text),
            Some(CleanMode::Paragraph) => self.paragraph(text),
            Some(CleanMode::Strict) => self.strict(text),
            Some(CleanMode::Noise) => noise(text),
            Some(CleanMode::Passthrough) | None => text.to_string(),
        };

        if let Some(marker) = self.truncate_after.as_deref().filter(|m| !m.is_empty()) {
            if let Some(idx) = cleaned.find(marker) {
                cleaned.truncate(idx + marker.len());
            }
        }

        CleanOutcome {
            lines_after: split_lines(&cleaned).len(),
            text: cleaned,
            lines_before,
        }
    }

    fn basic(&self, text: &str) -> String {
        let text = XML_DECL_RE.replace_all(text, "");
        let text = MARKUP_TAG_RE.replace_all(&text, "");
        let text = remove_noise(&text, " ");

        let mut seen = HashSet::new();
        let mut kept = Vec::new();
        for line in split_lines(&text) {
            let line = line.trim();
            if line.is_empty() || !(contains_native(line) || ALNUM_RUN_RE.is_match(line)) {
                continue;
            }
            let line = strip_all_control(line);
            if line.chars().count() > 3 && seen.insert(line.clone()) {
                kept.push(line);
            }
        }
        kept.join("\n")
    }

    fn garbled(&self, text: &str) -> String {
        split_lines(text)
            .into_iter()
            .filter(|line| {
                (contains_native(line) || MEANINGFUL_SYMBOL_RE.is_match(line))
                    && line.trim().chars().count() > 2
                    && !self.garbled_any.is_match(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 空行分段；段內各行以空白連接，空行原樣保留
    fn paragraph(&self, text: &str) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        for line in split_lines(text) {
            let line = line.trim();
            if line.is_empty() {
                if !current.is_empty() {
                    out.push(current.join(" "));
                    current.clear();
                }
                out.push(String::new());
                continue;
            }
            if self.garbled_triple.is_match(line) || DISALLOWED_RE.is_match(line) {
                continue;
            }
            if (contains_native(line) || MEANINGFUL_TEXT_RE.is_match(line))
                && line.chars().count() > 1
            {
                current.push(line);
            }
        }
        if !current.is_empty() {
            out.push(current.join(" "));
        }
        out.join("\n")
    }

    fn strict(&self, text: &str) -> String {
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();

        let mut flush = |current: &mut Vec<&str>| {
            if current.is_empty() {
                return;
            }
            let joined = current.join(" ");
            current.clear();
            if !self.looks_garbled(&joined) && looks_japanese(&joined) {
                paragraphs.push(joined);
            }
        };

        for line in split_lines(text) {
            let line = line.trim();
            if line.is_empty() {
                flush(&mut current);
                continue;
            }
            if !self.looks_garbled(line) && looks_japanese(line) {
                current.push(line);
            }
        }
        flush(&mut current);

        paragraphs.join("\n\n")
    }

    fn looks_garbled(&self, text: &str) -> bool {
        self.garbled_pair.is_match(text)
            || MARKUP_RUN_RE.is_match(text)
            || DISALLOWED_RUN_RE.is_match(text)
    }
}

fn looks_japanese(text: &str) -> bool {
    contains_native(text) || (MEANINGFUL_TEXT_RE.is_match(text) && text.chars().count() > 3)
}

fn noise(text: &str) -> String {
    strip_tags(&strip_control(&remove_noise(text, "")))
}
