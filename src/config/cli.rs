use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    /// 相對路徑以 `base_path` 為根；絕對路徑保持不變
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".".to_string())
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn list_files(&self, path: &str, recursive: bool) -> Result<Vec<String>> {
        let full_path = Path::new(&self.base_path).join(path);

        if !full_path.exists() {
            return Err(EtlError::InputNotFound {
                path: path.to_string(),
            });
        }

        if full_path.is_file() {
            return Ok(vec![path.to_string()]);
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(&full_path).max_depth(max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            // 回傳與輸入同一基準的路徑
            if let Ok(relative) = entry.path().strip_prefix(&full_path) {
                files.push(Path::new(path).join(relative).to_string_lossy().to_string());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_respects_recursion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.doc"), b"a").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("b.docx"), b"b").unwrap();

        let storage = LocalStorage::new(root.to_string_lossy().to_string());

        let all = tokio_test::block_on(storage.list_files(".", true)).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|p| p.ends_with("b.docx")));

        let top = tokio_test::block_on(storage.list_files(".", false)).unwrap();
        assert_eq!(top.len(), 1);
        assert!(top[0].ends_with("a.doc"));
    }

    #[test]
    fn test_missing_input_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());
        let err = tokio_test::block_on(storage.list_files("missing", true)).unwrap_err();
        assert!(matches!(err, EtlError::InputNotFound { .. }));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().to_string());
        tokio_test::block_on(storage.write_file("out/nested/a.txt", "本文".as_bytes())).unwrap();
        let data = tokio_test::block_on(storage.read_file("out/nested/a.txt")).unwrap();
        assert_eq!(data, "本文".as_bytes());
    }
}
