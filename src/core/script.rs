//! 日文字元判定與比例計算

use serde::Serialize;

/// 平假名、片假名、漢字以及 々〆〜
pub fn is_native_char(c: char) -> bool {
    is_kana(c) || ('\u{4E00}'..='\u{9FA0}').contains(&c) || matches!(c, '々' | '〆' | '〜')
}

pub fn is_kana(c: char) -> bool {
    ('\u{3041}'..='\u{3093}').contains(&c) || ('\u{30A1}'..='\u{30F6}').contains(&c)
}

pub fn contains_native(text: &str) -> bool {
    text.chars().any(is_native_char)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScriptScore {
    pub native_chars: usize,
    pub kana_chars: usize,
    pub total_chars: usize,
}

impl ScriptScore {
    pub fn of(text: &str) -> Self {
        let mut score = ScriptScore::default();
        for c in text.chars() {
            score.total_chars += 1;
            if is_native_char(c) {
                score.native_chars += 1;
                if is_kana(c) {
                    score.kana_chars += 1;
                }
            }
        }
        score
    }

    pub fn ratio(&self) -> f64 {
        self.native_chars as f64 / self.total_chars.max(1) as f64
    }

    /// 日文字元中假名所佔比例；全是漢字通常代表解碼錯誤
    pub fn kana_share(&self) -> f64 {
        self.kana_chars as f64 / self.native_chars.max(1) as f64
    }
}
