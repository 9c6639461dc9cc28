use crate::config::clean::CleanConfig;
use crate::config::heuristics::HeuristicsConfig;
use crate::domain::model::{BatchReport, SourceDocument, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 路徑為檔案時回傳自身；為目錄時列出其下的檔案
    fn list_files(
        &self,
        path: &str,
        recursive: bool,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_dir(&self) -> Option<&str>;
    fn output_encoding(&self) -> &str;
    fn lossy_encoding(&self) -> bool;
    fn recursive(&self) -> bool;
    fn report_path(&self) -> Option<&str>;
    fn failed_list_path(&self) -> Option<&str>;
    fn archive_path(&self) -> Option<&str>;
    fn heuristics(&self) -> &HeuristicsConfig;
    fn cleaning(&self) -> &CleanConfig;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceDocument>>;
    async fn transform(&self, sources: Vec<SourceDocument>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<BatchReport>;
}
