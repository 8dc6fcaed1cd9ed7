//! Corpus discovery and loading.

use crate::types::Document;
use docchat_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Recursively load every file under `root` whose extension is in `extensions`.
///
/// Files are returned in a stable, path-sorted order. Any read failure is an
/// error; empty files are returned as-is and filtered by the indexing pipeline.
pub fn load_documents(root: &Path, extensions: &[String]) -> AppResult<Vec<Document>> {
    if !root.is_dir() {
        return Err(AppError::Config(format!(
            "Documents directory does not exist: {:?}",
            root
        )));
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            AppError::Knowledge(format!("Failed to walk {:?}: {}", root, e))
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() || !has_extension(path, extensions) {
            continue;
        }

        let text = fs::read_to_string(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

        tracing::debug!("Loaded {:?} ({} bytes)", path, text.len());
        documents.push(Document::new(path, text));
    }

    tracing::info!("Loaded {} documents from {:?}", documents.len(), root);
    Ok(documents)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn md() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn test_loads_markdown_recursively() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("faq").join("umum");
        fs::create_dir_all(&nested).unwrap();

        fs::write(temp.path().join("b.md"), "Dokumen B").unwrap();
        fs::write(temp.path().join("a.md"), "Dokumen A").unwrap();
        fs::write(nested.join("c.MD"), "Dokumen C").unwrap();
        fs::write(temp.path().join("catatan.txt"), "bukan markdown").unwrap();

        let docs = load_documents(temp.path(), &md()).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();

        assert_eq!(texts, vec!["Dokumen A", "Dokumen B", "Dokumen C"]);
    }

    #[test]
    fn test_missing_directory_is_config_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("tidak-ada");
        assert!(matches!(
            load_documents(&missing, &md()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_empty_directory_yields_no_documents() {
        let temp = TempDir::new().unwrap();
        assert!(load_documents(temp.path(), &md()).unwrap().is_empty());
    }

    #[test]
    fn test_extension_matching() {
        let exts = vec![".md".to_string(), "markdown".to_string()];
        assert!(has_extension(Path::new("docs/a.md"), &exts));
        assert!(has_extension(Path::new("docs/a.markdown"), &exts));
        assert!(!has_extension(Path::new("docs/a.txt"), &exts));
        assert!(!has_extension(Path::new("docs/README"), &exts));
    }
}
