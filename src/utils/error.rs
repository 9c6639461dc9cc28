use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Input path not found: {path}")]
    InputNotFound { path: String },

    #[error("Unsupported document format '{extension}': {path}")]
    UnsupportedFormat { path: String, extension: String },

    #[error("No usable text found in {path}")]
    NoTextFound { path: String },

    #[error("Word binary format error: {message}")]
    OleFormat { message: String },

    #[error("Cannot encode text as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    #[error("Unsupported character encoding: {label}")]
    UnsupportedEncoding { label: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Extraction,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::UnsupportedEncoding { .. } => ErrorCategory::Configuration,
            EtlError::InputNotFound { .. } | EtlError::UnsupportedFormat { .. } => {
                ErrorCategory::Input
            }
            EtlError::NoTextFound { .. }
            | EtlError::OleFormat { .. }
            | EtlError::XmlError(_)
            | EtlError::ZipError(_) => ErrorCategory::Extraction,
            EtlError::Encoding { .. }
            | EtlError::ProcessingError { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Output,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一檔案失敗不影響其他檔案
            EtlError::NoTextFound { .. }
            | EtlError::UnsupportedFormat { .. }
            | EtlError::OleFormat { .. }
            | EtlError::XmlError(_)
            | EtlError::ZipError(_)
            | EtlError::Encoding { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 致命錯誤的程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,   // 部分文件失敗
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統錯誤
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::InputNotFound { .. } => "Check that the file or directory exists",
            EtlError::UnsupportedFormat { .. } => "Only .doc and .docx documents are converted",
            EtlError::NoTextFound { .. } => {
                "Try lowering --min-ratio / --min-chars or add more --decode-encodings"
            }
            EtlError::OleFormat { .. } | EtlError::ZipError(_) | EtlError::XmlError(_) => {
                "The document may be damaged or still open in another application"
            }
            EtlError::Encoding { .. } => {
                "Use --lossy to replace unencodable characters, or choose utf-8 output"
            }
            EtlError::UnsupportedEncoding { .. } => {
                "Use an encoding label such as utf-8, shift_jis, euc-jp or utf-16le"
            }
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::ConfigValidationError { .. } => {
                "Review the command line options or configuration file"
            }
            EtlError::IoError(_) => "Check file permissions and available disk space",
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "Check that the report path is writable"
            }
            EtlError::ProcessingError { .. } => "Re-run with --verbose for more detail",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Input problem: {}", self),
            ErrorCategory::Extraction => format!("Text extraction failed: {}", self),
            ErrorCategory::Output => format!("Could not write output: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
