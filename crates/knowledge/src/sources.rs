//! Document registry.
//!
//! One JSON line per uploaded document in `sources.jsonl`, stored next to
//! the index snapshot.

use crate::types::DocumentRecord;
use docqa_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

const SOURCES_FILE: &str = "sources.jsonl";

/// Append-only record of the documents held by an index.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    path: PathBuf,
}

impl SourceRegistry {
    /// Registry stored in `index_dir/sources.jsonl`.
    pub fn new(index_dir: &Path) -> Self {
        Self {
            path: index_dir.join(SOURCES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a document record.
    pub fn track(&self, record: &DocumentRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Index(format!("Failed to open {}: {}", SOURCES_FILE, e)))?;

        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)
            .map_err(|e| AppError::Index(format!("Failed to write {}: {}", SOURCES_FILE, e)))?;
        file.sync_all()?;

        tracing::debug!(filename = %record.filename, id = %record.id, "Tracked document");
        Ok(())
    }

    /// All tracked documents, oldest first. A missing file means none.
    pub fn list(&self) -> AppResult<Vec<DocumentRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record: DocumentRecord = serde_json::from_str(&line).map_err(|e| {
                AppError::Index(format!(
                    "Failed to parse line {} of {}: {}",
                    line_num + 1,
                    SOURCES_FILE,
                    e
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Forget every document. Idempotent.
    pub fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Cleared {}", SOURCES_FILE);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(filename: &str, chunks: usize) -> DocumentRecord {
        DocumentRecord {
            id: format!("id-{}", filename),
            filename: filename.to_string(),
            file_type: "pdf".to_string(),
            pages: 2,
            chunks,
            bytes: 2048,
            sha256: "0".repeat(64),
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn test_track_creates_file_and_directory() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(&temp.path().join("vector_db"));

        registry.track(&record("a.pdf", 3)).unwrap();
        assert!(registry.path().exists());
    }

    #[test]
    fn test_list_preserves_upload_order() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(temp.path());

        for (i, name) in ["one.pdf", "two.pdf", "three.pdf"].iter().enumerate() {
            registry.track(&record(name, i + 1)).unwrap();
        }

        let records = registry.list().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["one.pdf", "two.pdf", "three.pdf"]);
        assert_eq!(records[2].chunks, 3);
    }

    #[test]
    fn test_list_empty_when_no_file() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(temp.path());
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_rejects_corrupt_line() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(temp.path());
        registry.track(&record("a.pdf", 1)).unwrap();
        std::fs::write(registry.path(), "not json\n").unwrap();

        assert_eq!(registry.list().unwrap_err().kind(), "index_error");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let registry = SourceRegistry::new(temp.path());
        registry.track(&record("a.pdf", 1)).unwrap();

        registry.clear().unwrap();
        registry.clear().unwrap();
        assert!(!registry.path().exists());
        assert!(registry.list().unwrap().is_empty());
    }
}
