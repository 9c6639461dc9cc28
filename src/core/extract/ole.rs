//! Word 97-2003 (.doc) 二進位格式
//!
//! 讀取 OLE 複合檔中的 `WordDocument` 串流，解析 FIB 後從 `0Table`/`1Table`
//! 取得 piece table，再依 piece 的編碼 (UTF-16 或 cp1252) 還原本文。

use super::Extractor;
use crate::domain::model::Candidate;
use crate::utils::error::{EtlError, Result};
use encoding_rs::WINDOWS_1252;
use std::io::{Cursor, Read, Seek};

const FIB_MAGIC: u16 = 0xA5EC;
// FibRgFcLcb97 中 fcClx/lcbClx 的索引
const CLX_INDEX: usize = 33;

pub struct OleExtractor;

impl Extractor for OleExtractor {
    fn name(&self) -> &'static str {
        "ole"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<Candidate>> {
        let text = read_word_text(bytes)?;
        Ok(vec![Candidate::new(self.name(), "WordDocument", text)])
    }
}

#[derive(Debug, Clone)]
struct Fib {
    use_table1: bool,
    fc_min: u32,
    fc_mac: u32,
    fc_clx: u32,
    lcb_clx: u32,
}

#[derive(Debug, Clone)]
struct TextPiece {
    cp_start: u32,
    cp_end: u32,
    file_offset: u32,
    unicode: bool,
}

fn ole_error(message: impl Into<String>) -> EtlError {
    EtlError::OleFormat {
        message: message.into(),
    }
}

pub fn read_word_text(bytes: &[u8]) -> Result<String> {
    let mut ole = cfb::CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| ole_error(format!("not an OLE compound file: {}", e)))?;

    let word_stream = read_stream(&mut ole, "WordDocument")?;
    let fib = parse_fib(&word_stream).ok_or_else(|| ole_error("invalid File Information Block"))?;

    let mut raw = String::new();
    if fib.fc_clx != 0 && fib.lcb_clx != 0 {
        let table_name = if fib.use_table1 { "1Table" } else { "0Table" };
        match read_stream(&mut ole, table_name) {
            Ok(table_stream) => {
                let pieces = parse_text_pieces(&table_stream, fib.fc_clx, fib.lcb_clx);
                raw = decode_pieces(&word_stream, &pieces);
            }
            Err(e) => tracing::debug!("Piece table unavailable: {}", e),
        }
    }
    if raw.is_empty() {
        raw = decode_simple_range(&word_stream, fib.fc_min, fib.fc_mac);
    }

    let normalized = normalize_word_text(&raw);
    if normalized.trim().is_empty() {
        return Err(ole_error("document body is empty"));
    }
    Ok(normalized)
}

fn read_stream<F: Read + Seek>(ole: &mut cfb::CompoundFile<F>, name: &str) -> Result<Vec<u8>> {
    let mut stream = ole
        .open_stream(name)
        .map_err(|e| ole_error(format!("stream {} missing: {}", name, e)))?;
    let mut data = Vec::new();
    stream.read_to_end(&mut data)?;
    Ok(data)
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn parse_fib(word_stream: &[u8]) -> Option<Fib> {
    if word_stream.len() < 256 || read_u16_le(word_stream, 0)? != FIB_MAGIC {
        return None;
    }
    let flags = read_u16_le(word_stream, 0x0A)?;
    let fc_min = read_u32_le(word_stream, 0x18)?;
    let fc_mac = read_u32_le(word_stream, 0x1C)?;

    // FibBase 之後依序是 csw/rgW、cslw/rgLw、cbRgFcLcb/rgFcLcb
    let mut pos = 32usize;
    let csw = read_u16_le(word_stream, pos)? as usize;
    pos += 2 + csw * 2;
    let cslw = read_u16_le(word_stream, pos)? as usize;
    pos += 2 + cslw * 4;
    let cb_rg_fc_lcb = read_u16_le(word_stream, pos)? as usize;
    pos += 2;
    if word_stream.len() < pos + cb_rg_fc_lcb * 8 {
        return None;
    }

    let (fc_clx, lcb_clx) = if cb_rg_fc_lcb > CLX_INDEX {
        let offset = pos + CLX_INDEX * 8;
        (read_u32_le(word_stream, offset)?, read_u32_le(word_stream, offset + 4)?)
    } else {
        (0, 0)
    };

    Some(Fib {
        use_table1: flags & 0x0200 != 0,
        fc_min,
        fc_mac,
        fc_clx,
        lcb_clx,
    })
}

fn parse_text_pieces(table_stream: &[u8], fc_clx: u32, lcb_clx: u32) -> Vec<TextPiece> {
    let start = fc_clx as usize;
    let end = start + lcb_clx as usize;
    let Some(clx) = table_stream.get(start..end) else {
        return Vec::new();
    };

    let mut pos = 0usize;
    while pos < clx.len() {
        let clxt = clx[pos];
        pos += 1;
        match clxt {
            // Prc：格式資料，略過
            0x02 => {
                let Some(cb) = read_u16_le(clx, pos) else {
                    break;
                };
                pos += 2 + cb as usize;
            }
            // Pcdt：piece table 本體
            0x01 => {
                let Some(lcb) = read_u32_le(clx, pos).map(|v| v as usize) else {
                    break;
                };
                pos += 4;
                let Some(plc) = clx.get(pos..pos + lcb) else {
                    break;
                };
                return pieces_from_plc(plc);
            }
            _ => break,
        }
    }
    Vec::new()
}

fn pieces_from_plc(plc: &[u8]) -> Vec<TextPiece> {
    if plc.len() < 4 {
        return Vec::new();
    }
    // n+1 個 CP (各 4 bytes) 加上 n 個 PCD (各 8 bytes)
    let piece_count = (plc.len() - 4) / 12;
    let cps: Vec<u32> = (0..=piece_count)
        .map(|i| read_u32_le(plc, i * 4).unwrap_or(0))
        .collect();
    let pcd = &plc[(piece_count + 1) * 4..];

    (0..piece_count)
        .map(|i| {
            let fc = read_u32_le(pcd, i * 8 + 2).unwrap_or(0);
            let unicode = fc & 0x4000_0000 == 0;
            let file_offset = if unicode {
                fc
            } else {
                (fc & 0x3FFF_FFFF) / 2
            };
            TextPiece {
                cp_start: cps[i],
                cp_end: cps[i + 1],
                file_offset,
                unicode,
            }
        })
        .collect()
}

fn decode_pieces(word_stream: &[u8], pieces: &[TextPiece]) -> String {
    let mut out = String::new();
    for piece in pieces {
        if piece.cp_end <= piece.cp_start {
            continue;
        }
        let char_count = (piece.cp_end - piece.cp_start) as usize;
        let byte_count = if piece.unicode {
            char_count * 2
        } else {
            char_count
        };
        let start = piece.file_offset as usize;
        let Some(slice) = word_stream.get(start..start + byte_count) else {
            continue;
        };
        if piece.unicode {
            out.push_str(&utf16_le_lossy(slice));
        } else {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(slice);
            out.push_str(&text);
        }
    }
    out
}

fn decode_simple_range(word_stream: &[u8], fc_min: u32, fc_mac: u32) -> String {
    let start = fc_min as usize;
    let end = (fc_mac as usize).min(word_stream.len());
    if end <= start || end - start < 4 {
        return String::new();
    }
    let span = (end - start) & !1;
    utf16_le_lossy(&word_stream[start..start + span])
}

fn utf16_le_lossy(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// 將 Word 的控制字元轉成純文字排版
///
/// 段落、換行、分頁 → 換行；儲存格標記 → tab (連續標記代表列尾)；
/// 欄位代碼 0x13..0x14 之間的指令略過，只保留結果。
fn normalize_word_text(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    // true 表示該欄位已經過分隔符號 (0x14)
    let mut fields: Vec<bool> = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{13}' => fields.push(false),
            '\u{14}' => {
                if let Some(last) = fields.last_mut() {
                    *last = true;
                }
            }
            '\u{15}' => {
                fields.pop();
            }
            '\u{07}' => {
                let mut run = 1;
                while chars.peek() == Some(&'\u{07}') {
                    chars.next();
                    run += 1;
                }
                if run == 1 {
                    cleaned.push('\t');
                } else {
                    for _ in 0..run - 1 {
                        cleaned.push('\t');
                    }
                    cleaned.push('\n');
                }
            }
            '\r' | '\u{0B}' | '\u{0C}' => cleaned.push('\n'),
            '\u{1E}' => cleaned.push('-'),
            // 孤立代理字元與 cp1252 未定義位元組
            '\u{FFFD}' | '\u{80}'..='\u{9F}' => {}
            _ => {
                if fields.iter().any(|separated| !separated) {
                    continue;
                }
                if (c as u32) < 0x20 && c != '\t' && c != '\n' {
                    continue;
                }
                cleaned.push(c);
            }
        }
    }

    cleaned
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn word_stream_with_text(text: &str) -> Vec<u8> {
        let body: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let fc_min = 512u32;
        let fc_mac = fc_min + body.len() as u32;
        let mut stream = vec![0u8; fc_min as usize];
        stream[0..2].copy_from_slice(&FIB_MAGIC.to_le_bytes());
        stream[0x18..0x1C].copy_from_slice(&fc_min.to_le_bytes());
        stream[0x1C..0x20].copy_from_slice(&fc_mac.to_le_bytes());
        stream.extend_from_slice(&body);
        stream
    }

    fn compound_file(streams: &[(&str, Vec<u8>)]) -> Vec<u8> {
        let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        for (name, data) in streams {
            let mut stream = comp.create_stream(name).unwrap();
            stream.write_all(data).unwrap();
        }
        comp.flush().unwrap();
        comp.into_inner().into_inner()
    }

    #[test]
    fn test_reads_text_range_without_piece_table() {
        let stream = word_stream_with_text("給付金の請求手順\r支払件数の計上方法\r");
        let file = compound_file(&[("WordDocument", stream)]);

        let text = read_word_text(&file).unwrap();
        assert_eq!(text, "給付金の請求手順\n支払件数の計上方法");
    }

    #[test]
    fn test_field_instructions_are_dropped() {
        let raw = "参照\u{13} HYPERLINK \"http://x\" \u{14}リンク\u{15}先";
        assert_eq!(normalize_word_text(raw), "参照リンク先");
    }

    #[test]
    fn test_cell_marks_become_tabs() {
        let raw = "項目\u{07}件数\u{07}\u{07}支払\u{07}3\u{07}\u{07}";
        assert_eq!(normalize_word_text(raw), "項目\t件数\n支払\t3");
    }

    #[test]
    fn test_piece_table_with_compressed_piece() {
        // 一個 UTF-16 piece 加一個 8-bit piece
        let mut word = vec![0u8; 1024];
        let unicode_text: Vec<u8> = "査定".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        word[600..600 + unicode_text.len()].copy_from_slice(&unicode_text);
        word[800..803].copy_from_slice(b"ABC");

        let mut plc = Vec::new();
        for cp in [0u32, 2, 5] {
            plc.extend_from_slice(&cp.to_le_bytes());
        }
        let mut pcd = [0u8; 8];
        pcd[2..6].copy_from_slice(&600u32.to_le_bytes());
        plc.extend_from_slice(&pcd);
        let mut pcd = [0u8; 8];
        pcd[2..6].copy_from_slice(&((800u32 * 2) | 0x4000_0000).to_le_bytes());
        plc.extend_from_slice(&pcd);

        let mut clx = vec![0x01];
        clx.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        clx.extend_from_slice(&plc);

        let pieces = parse_text_pieces(&clx, 0, clx.len() as u32);
        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].unicode);
        assert!(!pieces[1].unicode);
        assert_eq!(decode_pieces(&word, &pieces), "査定ABC");
    }

    #[test]
    fn test_undecodable_units_are_dropped() {
        let mut word = vec![0u8; 64];
        let units: Vec<u16> = "給付金"
            .encode_utf16()
            .chain([0xD800])
            .chain("です".encode_utf16())
            .collect();
        let unicode: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        word[0..unicode.len()].copy_from_slice(&unicode);
        word[32..36].copy_from_slice(&[b'N', 0x81, 0x8D, b'o']);

        let pieces = vec![
            TextPiece {
                cp_start: 0,
                cp_end: units.len() as u32,
                file_offset: 0,
                unicode: true,
            },
            TextPiece {
                cp_start: units.len() as u32,
                cp_end: units.len() as u32 + 4,
                file_offset: 32,
                unicode: false,
            },
        ];
        let text = normalize_word_text(&decode_pieces(&word, &pieces));
        assert_eq!(text, "給付金ですNo");
    }

    #[test]
    fn test_non_ole_input_is_rejected() {
        let err = read_word_text(b"just some text").unwrap_err();
        assert!(matches!(err, EtlError::OleFormat { .. }));
    }
}
