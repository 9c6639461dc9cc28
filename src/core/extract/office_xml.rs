use super::Extractor;
use crate::domain::model::Candidate;
use crate::utils::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// .docx：直接讀取 `word/document.xml`，不需要評分
pub struct OfficeXmlExtractor;

impl Extractor for OfficeXmlExtractor {
    fn name(&self) -> &'static str {
        "office-xml"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Vec<Candidate>> {
        let text = read_docx_text(bytes)?;
        Ok(vec![Candidate::new(self.name(), DOCUMENT_PART, text)])
    }
}

pub fn read_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

/// 依文件順序輸出段落；表格每列的非空儲存格以 tab 連接
fn parse_document_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut row: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut table_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => paragraph.clear(),
                b"tbl" => table_depth += 1,
                b"tr" => row.clear(),
                b"tc" => cell.clear(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => {
                paragraph.push_str(&e.unescape()?);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = paragraph.trim().to_string();
                    paragraph.clear();
                    if text.is_empty() {
                        continue;
                    }
                    if table_depth > 0 {
                        if !cell.is_empty() {
                            cell.push(' ');
                        }
                        cell.push_str(&text);
                    } else {
                        lines.push(text);
                    }
                }
                b"tc" => {
                    let text = cell.trim().to_string();
                    cell.clear();
                    if !text.is_empty() {
                        row.push(text);
                    }
                }
                b"tr" => {
                    if !row.is_empty() {
                        lines.push(row.join("\t"));
                    }
                    row.clear();
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>給付金</w:t></w:r><w:r><w:t xml:space="preserve">の手順 &amp; 注意</w:t></w:r></w:p>
<w:p></w:p>
<w:tbl>
<w:tr><w:tc><w:p><w:r><w:t>項目</w:t></w:r></w:p></w:tc><w:tc><w:p></w:p></w:tc><w:tc><w:p><w:r><w:t>件数</w:t></w:r></w:p></w:tc></w:tr>
<w:tr><w:tc><w:p><w:r><w:t>支払</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>3</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>
<w:p><w:r><w:t>以上</w:t><w:tab/><w:t>終わり</w:t></w:r></w:p>
</w:body>
</w:document>"#;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_PART, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_and_tables_in_document_order() {
        let text = read_docx_text(&docx_with(BODY)).unwrap();
        assert_eq!(
            text,
            "給付金の手順 & 注意\n項目\t件数\n支払\t3\n以上\t終わり"
        );
    }

    #[test]
    fn test_missing_document_part_fails() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(read_docx_text(&bytes).is_err());
    }

    #[test]
    fn test_extractor_yields_single_candidate() {
        let candidates = OfficeXmlExtractor.extract(&docx_with(BODY)).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].method, "office-xml");
        assert!(candidates[0].score.native_chars > 0);
    }
}
