use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{AppError, AppResult, FileError};

/// 可处理的源文件扩展名
pub const SUPPORTED_EXTENSIONS: &[&str] = &["html", "htm", "md", "markdown", "txt", "pdf"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// 扫描文件夹中所有可处理的试卷文件，按文件名排序
pub async fn scan_documents(folder_path: &str) -> AppResult<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut documents = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.is_file() && is_supported(&path) {
            tracing::debug!(
                "发现: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.html", "a.md", "notes.docx", "c.PDF", "d.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.html")).unwrap();

        let found = scan_documents(&dir.path().to_string_lossy()).await.unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.md", "b.html", "c.PDF", "d.txt"]);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let err = scan_documents("/no/such/folder").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::DirectoryNotFound { .. })
        ));
    }
}
