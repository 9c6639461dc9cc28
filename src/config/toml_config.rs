use crate::config::clean::CleanConfig;
use crate::config::heuristics::HeuristicsConfig;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_optional_path, validate_output_encoding, validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
    #[serde(default)]
    pub cleaning: CleanConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: Option<String>,
    pub encoding: String,
    pub lossy: bool,
    pub report: Option<String>,
    pub failed_list: Option<String>,
    pub archive: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            encoding: "utf-8".to_string(),
            lossy: false,
            report: None,
            failed_list: None,
            archive: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DOC_ROOT})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_dir(&self) -> Option<&str> {
        self.output.directory.as_deref()
    }

    fn output_encoding(&self) -> &str {
        &self.output.encoding
    }

    fn lossy_encoding(&self) -> bool {
        self.output.lossy
    }

    fn recursive(&self) -> bool {
        self.input.recursive
    }

    fn report_path(&self) -> Option<&str> {
        self.output.report.as_deref()
    }

    fn failed_list_path(&self) -> Option<&str> {
        self.output.failed_list.as_deref()
    }

    fn archive_path(&self) -> Option<&str> {
        self.output.archive.as_deref()
    }

    fn heuristics(&self) -> &HeuristicsConfig {
        &self.heuristics
    }

    fn cleaning(&self) -> &CleanConfig {
        &self.cleaning
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input.path", &self.input.path)?;
        validate_optional_path("output.directory", self.output.directory.as_deref())?;
        validate_optional_path("output.report", self.output.report.as_deref())?;
        validate_optional_path("output.failed_list", self.output.failed_list.as_deref())?;
        validate_optional_path("output.archive", self.output.archive.as_deref())?;
        validate_output_encoding("output.encoding", &self.output.encoding)?;
        self.heuristics.validate()?;
        self.cleaning.validate()?;
        Ok(())
    }
}
