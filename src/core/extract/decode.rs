use super::Extractor;
use crate::config::heuristics::HeuristicsConfig;
use crate::core::encoding::decode_with_labels;
use crate::core::script::{contains_native, ScriptScore};
use crate::core::text::{remove_noise, split_lines, strip_all_control};
use crate::domain::model::Candidate;
use crate::utils::error::Result;

/// 以多種編碼解碼整個檔案，每種編碼產生一個候選
pub struct DecodeExtractor {
    labels: Vec<String>,
    min_line_chars: usize,
}

impl DecodeExtractor {
    pub fn new(labels: Vec<String>, min_line_chars: usize) -> Self {
        Self {
            labels,
            min_line_chars,
        }
    }

    /// 只留下含日文且長度超過門檻的行
    fn meaningful_lines(&self, decoded: &str) -> String {
        split_lines(decoded)
            .into_iter()
            .map(strip_all_control)
            .filter(|line| {
                contains_native(line) && line.trim().chars().count() > self.min_line_chars
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Extractor for DecodeExtractor {
    fn name(&self) -> &'static str {
        "decode"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<Candidate>> {
        let candidates = decode_with_labels(bytes, &self.labels)
            .into_iter()
            .filter_map(|(label, decoded)| {
                let text = self.meaningful_lines(&decoded);
                if text.is_empty() {
                    tracing::debug!("{} decode produced no Japanese lines", label);
                    return None;
                }
                Some(Candidate::new(self.name(), label, text))
            })
            .collect();
        Ok(candidates)
    }
}

/// 所有候選都未達門檻時的最後手段
///
/// 比例以未過濾的解碼結果計算，輸出則去除雜訊字元。假名門檻照樣適用，
/// 否則 ASCII 當成 UTF-16 解讀出的整片漢字也會被接受。
pub fn raw_fallback(bytes: &[u8], heuristics: &HeuristicsConfig) -> Option<Candidate> {
    let mut best: Option<(f64, &'static str, String)> = None;
    for (label, decoded) in decode_with_labels(bytes, &heuristics.decode_encodings) {
        let score = ScriptScore::of(&decoded);
        let ratio = score.ratio();
        tracing::debug!(
            "Raw decode {}: ratio {:.4}, kana share {:.4}",
            label,
            ratio,
            score.kana_share()
        );
        if ratio > heuristics.fallback_min_ratio
            && score.kana_share() >= heuristics.min_kana_share
            && best.as_ref().map_or(true, |(r, _, _)| ratio > *r)
        {
            best = Some((ratio, label, decoded));
        }
    }

    best.map(|(_, label, decoded)| {
        let text = remove_noise(&decoded, "");
        Candidate::new("raw-decode", label, text)
    })
}
