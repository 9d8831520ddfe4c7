use super::Segment;
use crate::error::StoreError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Durable storage for segment definitions.
///
/// Implementations only need whole-list load and save; the single-segment
/// operations are built on top of them.
pub trait SegmentStore {
    fn load_segments(&self) -> Result<Vec<Segment>, StoreError>;

    fn save_segments(&self, segments: &[Segment]) -> Result<(), StoreError>;

    fn get_segment(&self, id: &str) -> Result<Segment, StoreError> {
        self.load_segments()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Replaces the segment with the same id, or appends it.
    fn upsert_segment(&self, segment: Segment) -> Result<(), StoreError> {
        let mut segments = self.load_segments()?;
        match segments.iter_mut().find(|s| s.id == segment.id) {
            Some(existing) => *existing = segment,
            None => segments.push(segment),
        }
        self.save_segments(&segments)
    }

    fn remove_segment(&self, id: &str) -> Result<Segment, StoreError> {
        let mut segments = self.load_segments()?;
        let idx = segments
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = segments.remove(idx);
        self.save_segments(&segments)?;
        Ok(removed)
    }
}

/// Keeps all segments in one pretty-printed JSON array on disk.
///
/// A missing file reads as an empty store; every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl SegmentStore for JsonFileStore {
    fn load_segments(&self) -> Result<Vec<Segment>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))
    }

    fn save_segments(&self, segments: &[Segment]) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(segments).map_err(|e| StoreError::Parse(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        log::debug!(
            "Saved {} segment(s) to {}",
            segments.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// An in-process store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    segments: Mutex<Vec<Segment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments: Mutex::new(segments),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Segment>>, StoreError> {
        self.segments.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SegmentStore for MemoryStore {
    fn load_segments(&self) -> Result<Vec<Segment>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn save_segments(&self, segments: &[Segment]) -> Result<(), StoreError> {
        *self.lock()? = segments.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_upserts_and_removes() {
        let store = MemoryStore::new();
        store
            .upsert_segment(Segment::new("a", "First", "Age > 60"))
            .unwrap();
        store
            .upsert_segment(Segment::new("a", "Renamed", "Age > 65"))
            .unwrap();
        store
            .upsert_segment(Segment::new("b", "Second", "Equity > 1"))
            .unwrap();

        let all = store.load_segments().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.get_segment("a").unwrap().name, "Renamed");

        assert_eq!(store.remove_segment("a").unwrap().id, "a");
        assert_eq!(
            store.get_segment("a").unwrap_err(),
            StoreError::NotFound("a".to_string())
        );
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("segments.json"));
        assert!(store.load_segments().unwrap().is_empty());
    }
}
