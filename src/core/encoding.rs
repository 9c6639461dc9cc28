//! 多編碼解碼與輸出編碼
//!
//! 解碼採「忽略錯誤」語意：無法解碼的位元組直接丟棄，不留下替換字元。

use crate::utils::error::{EtlError, Result};
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8};

/// 接受 WHATWG 標籤，也接受 cp932、euc_jp 這類常見別名
pub fn resolve_label(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
    let normalized = match normalized.as_str() {
        "cp932" | "ms932" => "windows-31j",
        "iso2022-jp" | "iso2022jp" => "iso-2022-jp",
        "eucjp" => "euc-jp",
        other => other,
    };
    match Encoding::for_label(normalized.as_bytes()) {
        Some(encoding) if encoding != REPLACEMENT => Ok(encoding),
        _ => Err(EtlError::UnsupportedEncoding {
            label: label.to_string(),
        }),
    }
}

pub fn decode_lenient(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.chars().filter(|c| *c != '\u{FFFD}').collect()
}

/// 依序以每個編碼解碼；指向同一編碼的別名只解一次 (例如 shift_jis 與 cp932)
pub fn decode_with_labels(bytes: &[u8], labels: &[String]) -> Vec<(&'static str, String)> {
    let mut seen: Vec<&'static Encoding> = Vec::new();
    let mut decoded = Vec::new();

    for label in labels {
        let encoding = match resolve_label(label) {
            Ok(encoding) => encoding,
            Err(e) => {
                tracing::warn!("Skipping decode: {}", e);
                continue;
            }
        };
        if seen.contains(&encoding) {
            continue;
        }
        seen.push(encoding);
        decoded.push((encoding.name(), decode_lenient(bytes, encoding)));
    }

    decoded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Legacy(&'static Encoding),
}

impl OutputEncoding {
    pub fn from_label(label: &str) -> Result<Self> {
        let encoding = resolve_label(label)?;
        Ok(if encoding == UTF_8 {
            OutputEncoding::Utf8
        } else if encoding == UTF_16LE {
            OutputEncoding::Utf16Le
        } else if encoding == UTF_16BE {
            OutputEncoding::Utf16Be
        } else {
            OutputEncoding::Legacy(encoding)
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputEncoding::Utf8 => UTF_8.name(),
            OutputEncoding::Utf16Le => UTF_16LE.name(),
            OutputEncoding::Utf16Be => UTF_16BE.name(),
            OutputEncoding::Legacy(encoding) => encoding.name(),
        }
    }

    /// `lossy` 為 false 時，遇到無法表示的字元即回傳錯誤
    pub fn encode(&self, text: &str, lossy: bool) -> Result<Vec<u8>> {
        match self {
            OutputEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            // WHATWG 編碼器不輸出 UTF-16，這裡自行處理
            OutputEncoding::Utf16Le => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect()),
            OutputEncoding::Utf16Be => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect()),
            OutputEncoding::Legacy(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if !had_errors {
                    return Ok(bytes.into_owned());
                }

                if !lossy {
                    let offending = text
                        .chars()
                        .find(|c| !is_encodable(encoding, *c))
                        .map(|c| format!("character '{}' (U+{:04X}) is not representable", c, c as u32))
                        .unwrap_or_else(|| "text is not representable".to_string());
                    return Err(EtlError::Encoding {
                        encoding: encoding.name().to_string(),
                        message: offending,
                    });
                }

                let replaced: String = text
                    .chars()
                    .map(|c| if is_encodable(encoding, c) { c } else { '?' })
                    .collect();
                let (bytes, _, _) = encoding.encode(&replaced);
                Ok(bytes.into_owned())
            }
        }
    }
}

fn is_encodable(encoding: &'static Encoding, c: char) -> bool {
    let mut buf = [0u8; 4];
    let (_, _, had_errors) = encoding.encode(c.encode_utf8(&mut buf));
    !had_errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;

    #[test]
    fn test_decode_drops_invalid_bytes() {
        let mut bytes = "給付金".as_bytes().to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice("査定".as_bytes());
        assert_eq!(decode_lenient(&bytes, UTF_8), "給付金査定");
    }

    #[test]
    fn test_aliases_decoded_once() {
        let (sjis, _, _) = SHIFT_JIS.encode("手順書");
        let labels = vec![
            "shift_jis".to_string(),
            "cp932".to_string(),
            "windows-31j".to_string(),
            "utf-8".to_string(),
        ];
        let decoded = decode_with_labels(&sjis, &labels);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, "Shift_JIS");
        assert_eq!(decoded[0].1, "手順書");
    }

    #[test]
    fn test_unknown_label() {
        assert!(resolve_label("not-an-encoding").is_err());
        assert!(resolve_label("replacement").is_err());
    }

    #[test]
    fn test_encode_utf16_variants() {
        let le = OutputEncoding::from_label("utf-16le").unwrap();
        assert_eq!(le.encode("あ", false).unwrap(), vec![0x42, 0x30]);
        let be = OutputEncoding::from_label("utf-16be").unwrap();
        assert_eq!(be.encode("あ", false).unwrap(), vec![0x30, 0x42]);
    }

    #[test]
    fn test_strict_and_lossy_legacy_encode() {
        let sjis = OutputEncoding::from_label("shift_jis").unwrap();
        assert_eq!(sjis.name(), "Shift_JIS");
        assert!(sjis.encode("約款😀", false).is_err());

        let bytes = sjis.encode("約款😀", true).unwrap();
        assert_eq!(decode_lenient(&bytes, SHIFT_JIS), "約款?");
    }
}
