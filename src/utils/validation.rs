use crate::core::encoding::{resolve_label, OutputEncoding};
use crate::utils::error::{EtlError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_optional_path(field_name: &str, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => validate_path(field_name, path),
        None => Ok(()),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 輸出編碼必須能解析成可寫出的編碼
pub fn validate_output_encoding(field_name: &str, label: &str) -> Result<()> {
    OutputEncoding::from_label(label)
        .map(|_| ())
        .map_err(|_| EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: label.to_string(),
            reason: "Unknown output encoding".to_string(),
        })
}

pub fn validate_decode_labels(field_name: &str, labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "At least one encoding is required".to_string(),
        });
    }

    for label in labels {
        if resolve_label(label).is_err() {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: label.clone(),
                reason: "Unknown encoding label".to_string(),
            });
        }
    }
    Ok(())
}
