use regex::Regex;
use std::sync::LazyLock;

// 可讀字元以外的連續片段：ASCII 可列印字元、日文標點、假名、漢字、全半形字元、一般標點
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[^\x20-\x7E\x{3000}-\x{30FF}\x{4E00}-\x{9FFF}\x{3040}-\x{309F}\x{FF00}-\x{FF9F}\x{2000}-\x{206F}\n]+",
    )
    .expect("noise pattern is valid")
});

// 保留 \t \n \r
static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("control pattern is valid")
});

static ALL_CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("control pattern is valid"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// 以 `\r\n`、`\r`、`\n` 切行
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\n' => {
                lines.push(&text[start..idx]);
                start = idx + 1;
            }
            b'\r' => {
                lines.push(&text[start..idx]);
                if bytes.get(idx + 1) == Some(&b'\n') {
                    idx += 1;
                }
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

pub fn normalize_newlines(text: &str) -> String {
    split_lines(text).join("\n")
}

pub fn strip_control(text: &str) -> String {
    CONTROL_RE.replace_all(text, "").into_owned()
}

pub fn strip_all_control(text: &str) -> String {
    ALL_CONTROL_RE.replace_all(text, "").into_owned()
}

pub fn remove_noise(text: &str, replacement: &str) -> String {
    NOISE_RE.replace_all(text, replacement).into_owned()
}

pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").into_owned()
}
