use crate::core::convert::DocumentConverter;
use crate::core::encoding::OutputEncoding;
use crate::core::{ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::model::{
    is_supported_document, BatchReport, ConvertedDocument, DocumentSummary, FailedDocument,
    SourceDocument,
};
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

// Word 開啟中文件時留下的鎖定檔
const LOCK_FILE_PREFIX: &str = "~$";

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    source: &'a str,
    status: &'static str,
    output: &'a str,
    method: &'a str,
    native_ratio: f64,
    chars: usize,
    reason: &'a str,
}

pub struct ConversionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    converter: DocumentConverter,
    output_encoding: OutputEncoding,
}

impl<S: Storage, C: ConfigProvider> ConversionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let converter = DocumentConverter::new(config.heuristics().clone(), config.cleaning())?;
        let output_encoding = OutputEncoding::from_label(config.output_encoding())?;
        Ok(Self {
            storage,
            config,
            converter,
            output_encoding,
        })
    }

    /// 有 output_dir 時保留相對路徑，否則寫在原檔旁
    fn output_path_for(&self, source: &SourceDocument) -> String {
        let path = match self.config.output_dir() {
            Some(dir) => Path::new(dir).join(&source.relative_path),
            None => Path::new(&source.path).to_path_buf(),
        };
        path.with_extension("txt").to_string_lossy().to_string()
    }

    fn report_rows(report: &BatchReport) -> Vec<ReportRow<'_>> {
        let converted = report.converted.iter().map(|doc| ReportRow {
            source: &doc.source,
            status: "converted",
            output: &doc.output,
            method: &doc.method,
            native_ratio: doc.native_ratio,
            chars: doc.chars,
            reason: "",
        });
        let failed = report.failed.iter().map(|doc| ReportRow {
            source: &doc.source,
            status: "failed",
            output: "",
            method: "",
            native_ratio: 0.0,
            chars: 0,
            reason: &doc.reason,
        });
        converted.chain(failed).collect()
    }

    async fn write_report(&self, path: &str, report: &BatchReport) -> Result<()> {
        let rows = Self::report_rows(report);
        let data = if path.to_ascii_lowercase().ends_with(".json") {
            serde_json::to_vec_pretty(&rows)?
        } else {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            writer
                .into_inner()
                .map_err(|e| EtlError::ProcessingError {
                    message: format!("failed to finish report: {}", e),
                })?
        };

        tracing::debug!("Writing report with {} rows to {}", rows.len(), path);
        self.storage.write_file(path, &data).await
    }

    async fn write_failed_list(&self, path: &str, failed: &[FailedDocument]) -> Result<()> {
        let mut content = format!(
            "# Failed conversions: {} ({})\n",
            failed.len(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        for doc in failed {
            content.push_str(&format!("{}\t{}\n", doc.source, doc.reason));
        }
        self.storage.write_file(path, content.as_bytes()).await
    }

    /// 同名項目只保留最後寫入的版本，與磁碟上的輸出一致
    async fn write_archive(&self, path: &str, entries: &BTreeMap<String, Vec<u8>>) -> Result<()> {
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, data) in entries {
                zip.start_file(name.as_str(), SimpleFileOptions::default())?;
                zip.write_all(data)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!(
            "Writing archive with {} files ({} bytes) to {}",
            entries.len(),
            zip_data.len(),
            path
        );
        self.storage.write_file(path, &zip_data).await
    }
}

fn archive_name(source: &SourceDocument) -> String {
    Path::new(&source.relative_path)
        .with_extension("txt")
        .to_string_lossy()
        .replace('\\', "/")
}

fn is_lock_file(path: &str) -> bool {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOCK_FILE_PREFIX))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ConversionPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let input = self.config.input_path();
        let files = self.storage.list_files(input, self.config.recursive()).await?;

        // 直接指定的檔案不檢查副檔名，交給轉換階段回報
        let single_file = files.len() == 1 && files[0] == input;

        let mut sources = Vec::new();
        for path in files {
            if is_lock_file(&path) {
                tracing::debug!("Skipping Word lock file: {}", path);
                continue;
            }
            if !single_file && !is_supported_document(&path) {
                continue;
            }

            let relative_path = Path::new(&path)
                .strip_prefix(input)
                .ok()
                .filter(|relative| !relative.as_os_str().is_empty())
                .or_else(|| Path::new(&path).file_name().map(Path::new))
                .map(|relative| relative.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());

            sources.push(SourceDocument {
                path,
                relative_path,
            });
        }

        tracing::debug!("Discovered {} documents under {}", sources.len(), input);
        Ok(sources)
    }

    async fn transform(&self, sources: Vec<SourceDocument>) -> Result<TransformResult> {
        let mut result = TransformResult::default();
        let mut claimed_outputs = HashSet::new();

        for source in sources {
            let bytes = match self.storage.read_file(&source.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("❌ {}: {}", source.path, e);
                    result.failed.push(FailedDocument {
                        source: source.path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match self.converter.convert(&source.path, &bytes) {
                Ok(conversion) => {
                    let output_path = self.output_path_for(&source);
                    if !claimed_outputs.insert(output_path.clone()) {
                        tracing::warn!(
                            "{} overwrites an earlier output at {}",
                            source.path,
                            output_path
                        );
                    }
                    tracing::info!("✅ {} ({})", source.path, conversion.method);
                    result.converted.push(ConvertedDocument {
                        source,
                        output_path,
                        conversion,
                    });
                }
                Err(e) => {
                    tracing::warn!("❌ {}: {}", source.path, e);
                    result.failed.push(FailedDocument {
                        source: source.path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<BatchReport> {
        let lossy = self.config.lossy_encoding();
        let mut report = BatchReport {
            failed: result.failed,
            ..BatchReport::default()
        };
        let mut archive_entries = BTreeMap::new();

        for doc in result.converted {
            let written = match self.output_encoding.encode(&doc.conversion.text, lossy) {
                Ok(data) => self
                    .storage
                    .write_file(&doc.output_path, &data)
                    .await
                    .map(|_| data),
                Err(e) => Err(e),
            };

            match written {
                Ok(data) => {
                    tracing::debug!(
                        "Wrote {} ({} bytes, {})",
                        doc.output_path,
                        data.len(),
                        self.output_encoding.name()
                    );
                    if self.config.archive_path().is_some() {
                        let name = archive_name(&doc.source);
                        if archive_entries.insert(name.clone(), data).is_some() {
                            tracing::debug!("Archive entry {} replaced by {}", name, doc.source.path);
                        }
                    }
                    report.converted.push(DocumentSummary {
                        source: doc.source.path,
                        output: doc.output_path,
                        method: doc.conversion.method,
                        native_ratio: (doc.conversion.score.ratio() * 10_000.0).round() / 10_000.0,
                        chars: doc.conversion.text.chars().count(),
                    });
                }
                Err(e) => {
                    tracing::warn!("❌ {}: {}", doc.source.path, e);
                    report.failed.push(FailedDocument {
                        source: doc.source.path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(path) = self.config.report_path() {
            self.write_report(path, &report).await?;
            report.artifacts.push(path.to_string());
        }

        if let Some(path) = self.config.failed_list_path() {
            if report.has_failures() {
                self.write_failed_list(path, &report.failed).await?;
                report.artifacts.push(path.to_string());
            }
        }

        if let Some(path) = self.config.archive_path() {
            self.write_archive(path, &archive_entries).await?;
            report.artifacts.push(path.to_string());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::clean::CleanConfig;
    use crate::config::heuristics::HeuristicsConfig;
    use encoding_rs::SHIFT_JIS;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn list_files(&self, path: &str, _recursive: bool) -> Result<Vec<String>> {
            let files = self.files.lock().await;
            if files.contains_key(path) {
                return Ok(vec![path.to_string()]);
            }
            let prefix = format!("{}/", path);
            let mut found: Vec<String> = files
                .keys()
                .filter(|key| key.starts_with(&prefix))
                .cloned()
                .collect();
            if found.is_empty() {
                return Err(EtlError::InputNotFound {
                    path: path.to_string(),
                });
            }
            found.sort();
            Ok(found)
        }
    }

    struct MockConfig {
        input: String,
        output_dir: Option<String>,
        encoding: String,
        lossy: bool,
        report: Option<String>,
        failed_list: Option<String>,
        archive: Option<String>,
        heuristics: HeuristicsConfig,
        cleaning: CleanConfig,
    }

    impl MockConfig {
        fn new(input: &str) -> Self {
            Self {
                input: input.to_string(),
                output_dir: None,
                encoding: "utf-8".to_string(),
                lossy: false,
                report: None,
                failed_list: None,
                archive: None,
                heuristics: HeuristicsConfig::default(),
                cleaning: CleanConfig::default(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_dir(&self) -> Option<&str> {
            self.output_dir.as_deref()
        }

        fn output_encoding(&self) -> &str {
            &self.encoding
        }

        fn lossy_encoding(&self) -> bool {
            self.lossy
        }

        fn recursive(&self) -> bool {
            true
        }

        fn report_path(&self) -> Option<&str> {
            self.report.as_deref()
        }

        fn failed_list_path(&self) -> Option<&str> {
            self.failed_list.as_deref()
        }

        fn archive_path(&self) -> Option<&str> {
            self.archive.as_deref()
        }

        fn heuristics(&self) -> &HeuristicsConfig {
            &self.heuristics
        }

        fn cleaning(&self) -> &CleanConfig {
            &self.cleaning
        }
    }

    fn sjis_manual() -> Vec<u8> {
        let text = "支払件数の計上方法について説明します。\n不払件数は別表で管理します。\n".repeat(5);
        SHIFT_JIS.encode(&text).0.into_owned()
    }

    fn docx_manual() -> Vec<u8> {
        let xml = concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body><w:p><w:r><w:t>新様式の手順書です。</w:t></w:r></w:p></w:body></w:document>"
        );
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_extract_filters_and_skips_lock_files() {
        let storage = MockStorage::new();
        storage.put_file("docs/a.doc", b"a").await;
        storage.put_file("docs/sub/b.DOCX", b"b").await;
        storage.put_file("docs/~$a.doc", b"lock").await;
        storage.put_file("docs/readme.txt", b"text").await;

        let pipeline = ConversionPipeline::new(storage, MockConfig::new("docs")).unwrap();
        let sources = pipeline.extract().await.unwrap();

        let relative: Vec<&str> = sources.iter().map(|s| s.relative_path.as_str()).collect();
        assert_eq!(relative, vec!["a.doc", "sub/b.DOCX"]);
    }

    #[tokio::test]
    async fn test_extract_missing_input_is_fatal() {
        let pipeline = ConversionPipeline::new(MockStorage::new(), MockConfig::new("nowhere")).unwrap();
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let storage = MockStorage::new();
        storage.put_file("docs/good.doc", &sjis_manual()).await;
        storage
            .put_file("docs/bad.doc", "plain ascii bytes only ".repeat(30).as_bytes())
            .await;

        let mut config = MockConfig::new("docs");
        config.output_dir = Some("out".to_string());
        config.report = Some("out/report.csv".to_string());
        config.failed_list = Some("out/failed.txt".to_string());
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();

        let sources = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(sources).await.unwrap();
        assert_eq!(transformed.converted.len(), 1);
        assert_eq!(transformed.failed.len(), 1);
        assert_eq!(transformed.failed[0].source, "docs/bad.doc");

        let report = pipeline.load(transformed).await.unwrap();
        assert_eq!(report.total(), 2);
        assert!(report.has_failures());
        assert_eq!(report.artifacts, vec!["out/report.csv", "out/failed.txt"]);

        let text = storage.get_file("out/good.txt").await.unwrap();
        assert!(String::from_utf8(text).unwrap().contains("支払件数の計上方法"));

        let csv = String::from_utf8(storage.get_file("out/report.csv").await.unwrap()).unwrap();
        assert!(csv.starts_with("source,status,output,method,native_ratio,chars,reason"));
        assert!(csv.contains("docs/bad.doc,failed"));

        let failed = String::from_utf8(storage.get_file("out/failed.txt").await.unwrap()).unwrap();
        assert!(failed.starts_with("# Failed conversions: 1"));
        assert!(failed.contains("docs/bad.doc\t"));
    }

    #[tokio::test]
    async fn test_output_written_next_to_source_in_requested_encoding() {
        let storage = MockStorage::new();
        storage.put_file("manual.doc", &sjis_manual()).await;

        let mut config = MockConfig::new("manual.doc");
        config.encoding = "shift_jis".to_string();
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();

        let sources = pipeline.extract().await.unwrap();
        assert_eq!(sources[0].relative_path, "manual.doc");
        let transformed = pipeline.transform(sources).await.unwrap();
        pipeline.load(transformed).await.unwrap();

        let bytes = storage.get_file("manual.txt").await.unwrap();
        let (decoded, _, had_errors) = SHIFT_JIS.decode(&bytes);
        assert!(!had_errors);
        assert!(decoded.contains("不払件数は別表で管理します。"));
    }

    #[tokio::test]
    async fn test_unencodable_text_fails_unless_lossy() {
        let converted = ConvertedDocument {
            source: SourceDocument {
                path: "a.doc".to_string(),
                relative_path: "a.doc".to_string(),
            },
            output_path: "a.txt".to_string(),
            conversion: crate::domain::model::Conversion {
                text: "記号😀".to_string(),
                method: "decode:UTF-8".to_string(),
                score: Default::default(),
            },
        };

        let mut config = MockConfig::new("a.doc");
        config.encoding = "shift_jis".to_string();
        let storage = MockStorage::new();
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();
        let report = pipeline
            .load(TransformResult {
                converted: vec![converted.clone()],
                failed: vec![],
            })
            .await
            .unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(storage.get_file("a.txt").await.is_none());

        let mut config = MockConfig::new("a.doc");
        config.encoding = "shift_jis".to_string();
        config.lossy = true;
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();
        let report = pipeline
            .load(TransformResult {
                converted: vec![converted],
                failed: vec![],
            })
            .await
            .unwrap();
        assert_eq!(report.converted.len(), 1);
        let bytes = storage.get_file("a.txt").await.unwrap();
        assert_eq!(SHIFT_JIS.decode(&bytes).0, "記号?");
    }

    #[tokio::test]
    async fn test_archive_and_json_report() {
        let storage = MockStorage::new();
        storage.put_file("docs/sub/manual.doc", &sjis_manual()).await;

        let mut config = MockConfig::new("docs");
        config.archive = Some("texts.zip".to_string());
        config.report = Some("report.json".to_string());
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();

        let sources = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(sources).await.unwrap();
        let report = pipeline.load(transformed).await.unwrap();
        assert_eq!(report.converted[0].output, "docs/sub/manual.txt");

        let zip_bytes = storage.get_file("texts.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        assert!(archive.by_name("sub/manual.txt").is_ok());

        let json: serde_json::Value =
            serde_json::from_slice(&storage.get_file("report.json").await.unwrap()).unwrap();
        assert_eq!(json[0]["status"], "converted");
        assert_eq!(json[0]["source"], "docs/sub/manual.doc");
    }

    #[tokio::test]
    async fn test_colliding_outputs_keep_the_later_document() {
        let storage = MockStorage::new();
        storage.put_file("docs/a.doc", &sjis_manual()).await;
        storage.put_file("docs/a.docx", &docx_manual()).await;
        storage.put_file("docs/b.docx", &docx_manual()).await;

        let mut config = MockConfig::new("docs");
        config.output_dir = Some("out".to_string());
        config.archive = Some("out/texts.zip".to_string());
        let pipeline = ConversionPipeline::new(storage.clone(), config).unwrap();

        let sources = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(sources).await.unwrap();
        let report = pipeline.load(transformed).await.unwrap();

        assert_eq!(report.converted.len(), 3);
        assert!(!report.has_failures());
        assert_eq!(report.artifacts, vec!["out/texts.zip"]);

        let written = storage.get_file("out/a.txt").await.unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "新様式の手順書です。");

        let zip_bytes = storage.get_file("out/texts.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut entry = archive.by_name("a.txt").unwrap();
        let mut content = String::new();
        std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
        assert_eq!(content, "新様式の手順書です。");
    }
}
