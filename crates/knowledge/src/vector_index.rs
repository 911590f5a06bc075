//! In-memory vector index with JSON persistence.
//!
//! Entries are kept in insertion order behind a `tokio::sync::RwLock`:
//! `search`, `count` and `entries` share the read lock, while `add`,
//! `clear`, `truncate` and `load` take the write lock. Search is exact
//! (every entry is scored), which is adequate for per-workspace document
//! collections.

use docqa_core::config::SimilarityMetric;
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::types::ChunkMetadata;

const SNAPSHOT_VERSION: u32 = 1;

/// One stored chunk: its embedding, text and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub entry: IndexEntry,
    pub score: f32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    dimension: usize,
    metric: SimilarityMetric,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    dimension: usize,
    metric: SimilarityMetric,
    entries: Vec<IndexEntry>,
}

/// Vector index with a fixed dimension and similarity metric.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    metric: SimilarityMetric,
    path: Option<PathBuf>,
    entries: RwLock<Vec<IndexEntry>>,
}

impl VectorIndex {
    /// Create an empty, memory-only index.
    pub fn new(dimension: usize, metric: SimilarityMetric) -> Self {
        Self {
            dimension,
            metric,
            path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty index that persists to `path`.
    pub fn with_path(dimension: usize, metric: SimilarityMetric, path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(dimension, metric)
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append entries in order. Duplicate text is accepted.
    ///
    /// All entries are validated first, so a dimension error leaves the
    /// index unchanged.
    pub async fn add(&self, new_entries: Vec<IndexEntry>) -> AppResult<()> {
        self.check_dimension_of(new_entries.iter().map(|e| e.embedding.len()))?;

        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        tracing::debug!(total = entries.len(), "Added entries to vector index");
        Ok(())
    }

    /// Top-`k` entries by descending similarity.
    ///
    /// Equal scores keep insertion order. Returns fewer than `k` hits when
    /// the index is smaller, and nothing for an empty index or `k == 0`.
    pub async fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        self.check_dimension_of(std::iter::once(query.len()))?;

        let entries = self.entries.read().await;
        if k == 0 || entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.score(query, query_norm, &entry.embedding)))
            .collect();

        // sort_by is stable, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                entry: entries[i].clone(),
                score,
            })
            .collect())
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Snapshot of all entries in insertion order.
    pub async fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().await.clone()
    }

    /// Remove every entry. Idempotent.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop entries past `len`, undoing a partial append.
    pub async fn truncate(&self, len: usize) {
        self.entries.write().await.truncate(len);
    }

    /// Write the full entry set to the index path.
    ///
    /// The snapshot goes to a temporary file first and is renamed over the
    /// previous one, so readers never observe a half-written index.
    pub async fn persist(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = {
            let entries = self.entries.read().await;
            serde_json::to_vec(&SnapshotRef {
                version: SNAPSHOT_VERSION,
                dimension: self.dimension,
                metric: self.metric,
                entries: &entries,
            })?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Persisted vector index");
        Ok(())
    }

    /// Replace the in-memory entries with the snapshot at the index path.
    ///
    /// A missing file yields an empty index.
    ///
    /// # Errors
    /// - `DimensionMismatch` if the snapshot was built with another dimension
    /// - `Index` for unreadable or unsupported snapshots
    pub async fn load(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No index snapshot; starting empty");
                self.entries.write().await.clear();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Index(format!("Corrupt index snapshot {}: {}", path.display(), e))
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(AppError::Index(format!(
                "Unsupported index snapshot version {}",
                snapshot.version
            )));
        }

        if snapshot.dimension != self.dimension {
            return Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual: snapshot.dimension,
            });
        }

        if snapshot.metric != self.metric {
            tracing::warn!(
                stored = snapshot.metric.as_str(),
                configured = self.metric.as_str(),
                "Index was built with a different metric; scoring with the configured one"
            );
        }

        self.check_dimension_of(snapshot.entries.iter().map(|e| e.embedding.len()))?;

        let count = snapshot.entries.len();
        *self.entries.write().await = snapshot.entries;

        tracing::info!(path = %path.display(), entries = count, "Loaded vector index");
        Ok(())
    }

    fn check_dimension_of(&self, mut lengths: impl Iterator<Item = usize>) -> AppResult<()> {
        match lengths.find(|&len| len != self.dimension) {
            Some(actual) => Err(AppError::DimensionMismatch {
                expected: self.dimension,
                actual,
            }),
            None => Ok(()),
        }
    }

    fn score(&self, query: &[f32], query_norm: f32, embedding: &[f32]) -> f32 {
        let dot = dot(query, embedding);
        match self.metric {
            SimilarityMetric::InnerProduct => dot,
            SimilarityMetric::Cosine => {
                let denom = query_norm * norm(embedding);
                if denom == 0.0 {
                    0.0
                } else {
                    dot / denom
                }
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
