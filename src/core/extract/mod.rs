//! 互相獨立的文字抽取策略
//!
//! 每個策略只負責產生候選文字，評分與選擇交給 [`crate::core::select`]。
//! 任一策略失敗不影響其他策略。

pub mod decode;
pub mod office_xml;
pub mod ole;
pub mod utf16_scan;

use crate::config::heuristics::HeuristicsConfig;
use crate::domain::model::Candidate;
use crate::utils::error::Result;

pub use decode::DecodeExtractor;
pub use office_xml::OfficeXmlExtractor;
pub use ole::OleExtractor;
pub use utf16_scan::Utf16ScanExtractor;

pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<Vec<Candidate>>;
}

/// 舊版 Word 二進位檔依序嘗試的策略
pub fn legacy_extractors(heuristics: &HeuristicsConfig) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(OleExtractor),
        Box::new(Utf16ScanExtractor::new(heuristics.chunk_min_len)),
        Box::new(DecodeExtractor::new(
            heuristics.decode_encodings.clone(),
            heuristics.min_line_chars,
        )),
    ]
}
