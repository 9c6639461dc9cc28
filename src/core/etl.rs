use crate::core::Pipeline;
use crate::domain::model::BatchReport;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 單一文件失敗只記入報告；只有探索輸入與附加輸出的錯誤會中止
    pub async fn run(&self) -> Result<BatchReport> {
        tracing::info!("Starting conversion run");

        // Extract
        let sources = self.pipeline.extract().await?;
        tracing::info!("📂 Found {} documents", sources.len());
        self.monitor.log_phase("Extract", sources.len());

        // Transform
        let transformed = self.pipeline.transform(sources).await?;
        tracing::info!(
            "🔄 Converted {} documents, {} failed",
            transformed.converted.len(),
            transformed.failed.len()
        );
        self.monitor.log_phase(
            "Transform",
            transformed.converted.len() + transformed.failed.len(),
        );

        // Load
        let report = self.pipeline.load(transformed).await?;
        tracing::info!(
            "💾 Wrote {} text files ({} failed in total)",
            report.converted.len(),
            report.failed.len()
        );
        for artifact in &report.artifacts {
            tracing::info!("📁 {}", artifact);
        }
        self.monitor.log_phase("Load", report.converted.len());
        self.monitor.log_summary(&report);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FailedDocument, SourceDocument, TransformResult};
    use crate::utils::error::EtlError;

    struct FixedPipeline {
        missing_input: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for FixedPipeline {
        async fn extract(&self) -> Result<Vec<SourceDocument>> {
            if self.missing_input {
                return Err(EtlError::InputNotFound {
                    path: "docs".to_string(),
                });
            }
            Ok(vec![SourceDocument {
                path: "docs/a.doc".to_string(),
                relative_path: "a.doc".to_string(),
            }])
        }

        async fn transform(&self, sources: Vec<SourceDocument>) -> Result<TransformResult> {
            Ok(TransformResult {
                converted: vec![],
                failed: sources
                    .into_iter()
                    .map(|s| FailedDocument {
                        source: s.path,
                        reason: "no text".to_string(),
                    })
                    .collect(),
            })
        }

        async fn load(&self, result: TransformResult) -> Result<BatchReport> {
            Ok(BatchReport {
                failed: result.failed,
                ..BatchReport::default()
            })
        }
    }

    #[tokio::test]
    async fn test_run_reports_per_file_failures() {
        let engine = EtlEngine::new(FixedPipeline {
            missing_input: false,
        });
        let report = engine.run().await.unwrap();
        assert_eq!(report.total(), 1);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_run_with_monitoring_enabled() {
        let engine = EtlEngine::new_with_monitoring(
            FixedPipeline {
                missing_input: false,
            },
            true,
        );
        let report = engine.run().await.unwrap();
        assert_eq!(report.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_run_aborts_on_missing_input() {
        let engine = EtlEngine::new_with_monitoring(
            FixedPipeline {
                missing_input: true,
            },
            false,
        );
        assert!(matches!(
            engine.run().await,
            Err(EtlError::InputNotFound { .. })
        ));
    }
}
