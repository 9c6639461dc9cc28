use crate::core::script::ScriptScore;
use serde::Serialize;
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["doc", "docx"];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Word 97-2003 二進位檔 (.doc)
    Legacy,
    /// Office Open XML (.docx)
    OfficeXml,
}

impl DocumentKind {
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_ascii_lowercase();
        match extension.as_str() {
            "doc" => Some(DocumentKind::Legacy),
            "docx" => Some(DocumentKind::OfficeXml),
            _ => None,
        }
    }

    /// 檔頭優先於副檔名；無法辨識時沿用副檔名判斷
    pub fn sniff(bytes: &[u8], declared: DocumentKind) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            DocumentKind::OfficeXml
        } else if bytes.starts_with(OLE_MAGIC) {
            DocumentKind::Legacy
        } else if declared == DocumentKind::OfficeXml {
            // 不是 zip 的 .docx 只能當成二進位資料處理
            DocumentKind::Legacy
        } else {
            declared
        }
    }
}

pub fn is_supported_document(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: String,
    /// 相對於輸入根目錄的路徑，用於決定輸出位置
    pub relative_path: String,
}

/// 某個抽取策略產生的候選文字
#[derive(Debug, Clone)]
pub struct Candidate {
    pub method: &'static str,
    pub label: String,
    pub text: String,
    pub score: ScriptScore,
}

impl Candidate {
    pub fn new(method: &'static str, label: impl Into<String>, text: String) -> Self {
        let score = ScriptScore::of(&text);
        Self {
            method,
            label: label.into(),
            text,
            score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub text: String,
    pub method: String,
    pub score: ScriptScore,
}

#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub source: SourceDocument,
    pub output_path: String,
    pub conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDocument {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub converted: Vec<ConvertedDocument>,
    pub failed: Vec<FailedDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub source: String,
    pub output: String,
    pub method: String,
    pub native_ratio: f64,
    pub chars: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub converted: Vec<DocumentSummary>,
    pub failed: Vec<FailedDocument>,
    /// 報告、失敗清單、壓縮檔等附加輸出
    pub artifacts: Vec<String>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
