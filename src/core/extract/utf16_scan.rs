use super::Extractor;
use crate::core::script::contains_native;
use crate::core::text::{remove_noise, strip_control};
use crate::domain::model::Candidate;
use crate::utils::error::Result;

/// 不解析結構，直接把整個檔案當成 UTF-16LE 掃描日文片段
pub struct Utf16ScanExtractor {
    chunk_min_len: usize,
}

impl Utf16ScanExtractor {
    pub fn new(chunk_min_len: usize) -> Self {
        Self { chunk_min_len }
    }
}

impl Extractor for Utf16ScanExtractor {
    fn name(&self) -> &'static str {
        "utf16-scan"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<Candidate>> {
        let text = scan_utf16(bytes, self.chunk_min_len);
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Candidate::new(self.name(), "UTF-16LE", text)])
    }
}

fn is_japanese_unit(unit: u16) -> bool {
    matches!(unit,
        0x3000..=0x303F   // 和文標點
        | 0x3040..=0x309F // 平假名
        | 0x30A0..=0x30FF // 片假名
        | 0x4E00..=0x9FFF // 漢字
        | 0xFF01..=0xFF5E // 全形英數與符號
        | 0x2025 | 0x2026
    )
}

fn is_layout_unit(unit: u16) -> bool {
    matches!(unit,
        0x09 | 0x0A | 0x0D | 0x20 | 0xA0
        | 0x30..=0x39
        | 0x41..=0x5A
        | 0x61..=0x7A
        | 0x25 | 0x26 | 0x28 | 0x29 | 0x2C | 0x2E | 0x2F | 0x3A | 0x3B
        | 0x5B | 0x5D | 0x7B | 0x7D
        | 0x2019
    )
}

pub fn scan_utf16(bytes: &[u8], chunk_min_len: usize) -> String {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    let mut flush = |current: &mut String, current_len: &mut usize| {
        if *current_len > chunk_min_len && contains_native(current) {
            chunks.push(std::mem::take(current));
        }
        current.clear();
        *current_len = 0;
    };

    for pair in bytes.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if is_japanese_unit(unit) || is_layout_unit(unit) {
            let c = if unit == 0x0D {
                '\n'
            } else {
                // 白名單內都是 BMP 非代理字元
                char::from_u32(u32::from(unit)).unwrap_or(' ')
            };
            current.push(c);
            current_len += 1;
        } else {
            flush(&mut current, &mut current_len);
        }
    }
    flush(&mut current, &mut current_len);

    // 已被較早片段完整包含的片段視為重複
    let mut unique: Vec<String> = Vec::new();
    for chunk in chunks {
        if !unique.iter().any(|kept| kept.contains(chunk.as_str())) {
            unique.push(chunk);
        }
    }

    let filtered = strip_control(&remove_noise(&unique.join("\n"), ""));
    filtered
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_finds_runs_between_binary_noise() {
        let mut bytes = vec![0xFF, 0xFF, 0x00, 0x00, 0x01, 0x02];
        bytes.extend(utf16("給付金の請求に関する手順書です。\r第二版"));
        bytes.extend([0x00, 0x00, 0xFF, 0xFE]);
        bytes.extend(utf16("短い"));
        bytes.extend([0xFF, 0xFF]);

        let text = scan_utf16(&bytes, 15);
        assert_eq!(text, "給付金の請求に関する手順書です。\n第二版");
    }

    #[test]
    fn test_duplicate_runs_are_dropped() {
        let run = utf16("支払査定の実務手順について説明します。");
        let mut bytes = run.clone();
        bytes.extend([0xFF, 0xFF]);
        bytes.extend(run);

        let text = scan_utf16(&bytes, 15);
        assert_eq!(text, "支払査定の実務手順について説明します。");
    }

    #[test]
    fn test_ascii_only_runs_are_ignored() {
        let bytes = utf16("This is plain ASCII text without Japanese");
        assert!(Utf16ScanExtractor::new(15).extract(&bytes).unwrap().is_empty());
    }
}
