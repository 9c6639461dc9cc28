use crate::config::clean::CleanConfig;
use crate::config::heuristics::HeuristicsConfig;
use crate::core::clean::TextCleaner;
use crate::core::extract::{self, decode, Extractor, OfficeXmlExtractor};
use crate::core::postprocess;
use crate::core::script::ScriptScore;
use crate::core::select::CandidateSelector;
use crate::domain::model::{Candidate, Conversion, DocumentKind};
use crate::utils::error::{EtlError, Result};
use std::path::Path;

/// 單一文件的轉換：抽取 → 評分選擇 → 整理 → (可選) 清理
pub struct DocumentConverter {
    heuristics: HeuristicsConfig,
    cleaner: Option<TextCleaner>,
    office_xml: OfficeXmlExtractor,
    legacy: Vec<Box<dyn Extractor>>,
}

impl DocumentConverter {
    pub fn new(heuristics: HeuristicsConfig, cleaning: &CleanConfig) -> Result<Self> {
        let cleaner = if cleaning.is_enabled() {
            Some(TextCleaner::new(cleaning)?)
        } else {
            None
        };
        let legacy = extract::legacy_extractors(&heuristics);
        Ok(Self {
            heuristics,
            cleaner,
            office_xml: OfficeXmlExtractor,
            legacy,
        })
    }

    pub fn convert(&self, path: &str, bytes: &[u8]) -> Result<Conversion> {
        let declared = DocumentKind::from_path(path).ok_or_else(|| EtlError::UnsupportedFormat {
            path: path.to_string(),
            extension: Path::new(path)
                .extension()
                .map(|ext| ext.to_string_lossy().to_string())
                .unwrap_or_default(),
        })?;

        let kind = DocumentKind::sniff(bytes, declared);
        if kind != declared {
            tracing::debug!("{}: content looks like {:?}", path, kind);
        }

        let mut conversion = match kind {
            DocumentKind::OfficeXml => match self.office_xml.extract(bytes) {
                Ok(mut candidates) if !candidates.is_empty() => {
                    let candidate = candidates.remove(0);
                    Conversion {
                        method: candidate.method.to_string(),
                        text: candidate.text,
                        score: candidate.score,
                    }
                }
                Ok(_) => self.convert_legacy(path, bytes)?,
                Err(e) => {
                    tracing::warn!(
                        "{}: OOXML extraction failed ({}), trying binary strategies",
                        path,
                        e
                    );
                    self.convert_legacy(path, bytes)?
                }
            },
            DocumentKind::Legacy => self.convert_legacy(path, bytes)?,
        };

        if let Some(cleaner) = &self.cleaner {
            let outcome = cleaner.clean(&conversion.text);
            tracing::debug!(
                "{}: cleaning kept {} of {} lines",
                path,
                outcome.lines_after,
                outcome.lines_before
            );
            conversion.text = outcome.text;
            conversion.score = ScriptScore::of(&conversion.text);
        }

        Ok(conversion)
    }

    fn convert_legacy(&self, path: &str, bytes: &[u8]) -> Result<Conversion> {
        let mut candidates: Vec<Candidate> = Vec::new();
        for extractor in &self.legacy {
            match extractor.extract(bytes) {
                Ok(found) => candidates.extend(found),
                Err(e) => tracing::debug!("{}: {} strategy failed: {}", path, extractor.name(), e),
            }
        }

        let selector = CandidateSelector::new(&self.heuristics);
        if let Some(best) = selector.select(candidates) {
            tracing::info!(
                "{}: selected {}:{} (ratio {:.3}, {} chars)",
                path,
                best.method,
                best.label,
                best.score.ratio(),
                best.score.total_chars
            );
            // 報告中的比例與字數都以實際寫出的文字計算
            let text = postprocess::finalize(&best.text, &self.heuristics);
            return Ok(Conversion {
                score: ScriptScore::of(&text),
                text,
                method: format!("{}:{}", best.method, best.label),
            });
        }

        tracing::warn!("{}: no candidate met the thresholds, trying raw decode", path);
        match decode::raw_fallback(bytes, &self.heuristics) {
            Some(candidate) => {
                let text = postprocess::finalize(&candidate.text, &self.heuristics);
                Ok(Conversion {
                    score: ScriptScore::of(&text),
                    text,
                    method: format!("{}:{}", candidate.method, candidate.label),
                })
            }
            None => Err(EtlError::NoTextFound {
                path: path.to_string(),
            }),
        }
    }
}
