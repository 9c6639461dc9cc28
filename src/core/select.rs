use crate::config::heuristics::HeuristicsConfig;
use crate::domain::model::Candidate;
use std::cmp::Ordering;

/// 依日文比例挑出最佳候選
pub struct CandidateSelector<'a> {
    heuristics: &'a HeuristicsConfig,
}

impl<'a> CandidateSelector<'a> {
    pub fn new(heuristics: &'a HeuristicsConfig) -> Self {
        Self { heuristics }
    }

    /// 字數、日文比例、假名比例都要達標
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        let score = &candidate.score;
        score.total_chars > self.heuristics.min_chars
            && score.ratio() > self.heuristics.min_ratio
            && score.kana_share() >= self.heuristics.min_kana_share
    }

    /// 比例最高者勝出；同分時取較長者，再同分取較早的策略
    pub fn select(&self, candidates: Vec<Candidate>) -> Option<Candidate> {
        candidates
            .into_iter()
            .enumerate()
            .filter(|(_, candidate)| {
                let accepted = self.accepts(candidate);
                tracing::debug!(
                    "Candidate {}:{} chars={} ratio={:.4} kana_share={:.4} accepted={}",
                    candidate.method,
                    candidate.label,
                    candidate.score.total_chars,
                    candidate.score.ratio(),
                    candidate.score.kana_share(),
                    accepted
                );
                accepted
            })
            .max_by(|(ia, a), (ib, b)| {
                a.score
                    .ratio()
                    .partial_cmp(&b.score.ratio())
                    .unwrap_or(Ordering::Equal)
                    .then(a.score.total_chars.cmp(&b.score.total_chars))
                    .then(ib.cmp(ia))
            })
            .map(|(_, candidate)| candidate)
    }
}
