//! 選出文字的收尾整理

use crate::config::heuristics::HeuristicsConfig;
use crate::core::text::{normalize_newlines, strip_control, strip_tags};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// 轉換工具插入的 `--- ... ---` 標記行
static MARKER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---.*?---[ \t]*(?:\n|$)").expect("marker pattern is valid"));

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

// RTF 殘留的控制字，例如 \par
static ESCAPE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\+[A-Za-z]+").expect("escape pattern is valid"));

pub fn finalize(text: &str, heuristics: &HeuristicsConfig) -> String {
    let text = normalize_newlines(text);
    let text = MARKER_LINE_RE.replace_all(&text, "");
    let mut text = strip_control(&text);

    if heuristics.dedupe_lines {
        let unmarked = ESCAPE_WORD_RE.replace_all(&strip_tags(&text), "").into_owned();
        text = dedupe_lines(&unmarked);
    }

    if let Some(anchor) = heuristics.anchor.as_deref().filter(|a| !a.is_empty()) {
        match text.find(anchor) {
            Some(idx) => text = text[idx..].to_string(),
            None => tracing::debug!("Anchor {:?} not found; keeping full text", anchor),
        }
    }

    BLANK_RUN_RE.replace_all(&text, "\n\n").into_owned()
}

/// 去除行首尾空白、空行與重複行，保留第一次出現的順序
pub fn dedupe_lines(text: &str) -> String {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}
