//! # Artifact Storage
//!
//! Where each generated SVG ends up. Artifacts are write-once from the
//! loop's point of view and never read back by it; `MemoryStore` exposes
//! reads for inspection and tests.

use crate::error::{self, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which step of the loop produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactName {
    /// The drawing generated from the text prompt
    Initial,
    /// The redraw from iteration `n` (1-based)
    Iteration(usize),
}

impl ArtifactName {
    pub fn file_name(&self) -> String {
        match self {
            ArtifactName::Initial => "initial_drawing.svg".to_string(),
            ArtifactName::Iteration(n) => format!("iteration_{}_drawing.svg", n),
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Storage backend trait
pub trait ArtifactStore {
    /// Create or overwrite the artifact with exactly `svg`
    fn save(&mut self, name: ArtifactName, svg: &str) -> Result<()>;

    /// Human-readable location of an artifact, for log lines
    fn location(&self, name: ArtifactName) -> String;
}

/// In-memory storage (volatile, useful for testing)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: Vec<(ArtifactName, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: ArtifactName) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, svg)| svg.as_str())
    }

    /// Names in the order they were first written
    pub fn names(&self) -> Vec<ArtifactName> {
        self.artifacts.iter().map(|(n, _)| *n).collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn save(&mut self, name: ArtifactName, svg: &str) -> Result<()> {
        match self.artifacts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = svg.to_string(),
            None => self.artifacts.push((name, svg.to_string())),
        }
        Ok(())
    }

    fn location(&self, name: ArtifactName) -> String {
        format!("memory:{}", name)
    }
}

/// File-based storage: one `.svg` file per artifact in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path).map_err(|e| {
            error::io_error(format!("Failed to create output dir {}: {}", base_path.display(), e))
                .with_operation("file_store::new")
                .set_source(e)
        })?;
        Ok(Self { base_path })
    }

    pub fn path_of(&self, name: ArtifactName) -> PathBuf {
        self.base_path.join(name.file_name())
    }
}

impl ArtifactStore for FileStore {
    fn save(&mut self, name: ArtifactName, svg: &str) -> Result<()> {
        let path = self.path_of(name);
        std::fs::write(&path, svg).map_err(|e| {
            error::storage_failed(name.file_name(), format!("Failed to write {}: {}", path.display(), e))
                .with_operation("file_store::save")
                .set_source(e)
        })
    }

    fn location(&self, name: ArtifactName) -> String {
        self.path_of(name).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraw_error::ErrorKind;

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(ArtifactName::Initial.file_name(), "initial_drawing.svg");
        assert_eq!(ArtifactName::Iteration(1).file_name(), "iteration_1_drawing.svg");
        assert_eq!(ArtifactName::Iteration(12).to_string(), "iteration_12_drawing.svg");
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.save(ArtifactName::Initial, "<svg>a</svg>").unwrap();
        store.save(ArtifactName::Iteration(1), "<svg>b</svg>").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ArtifactName::Initial), Some("<svg>a</svg>"));
        assert_eq!(store.get(ArtifactName::Iteration(2)), None);
        assert_eq!(store.location(ArtifactName::Initial), "memory:initial_drawing.svg");
    }

    #[test]
    fn test_memory_store_overwrites() {
        let mut store = MemoryStore::new();
        store.save(ArtifactName::Initial, "old").unwrap();
        store.save(ArtifactName::Iteration(1), "one").unwrap();
        store.save(ArtifactName::Initial, "new").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ArtifactName::Initial), Some("new"));
        assert_eq!(store.names(), vec![ArtifactName::Initial, ArtifactName::Iteration(1)]);
    }

    #[test]
    fn test_file_store_writes_exact_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("out")).unwrap();

        store.save(ArtifactName::Initial, "exit").unwrap();
        store.save(ArtifactName::Iteration(3), "<svg>x</svg>").unwrap();
        store.save(ArtifactName::Iteration(3), "<svg>y</svg>").unwrap();

        let initial = std::fs::read_to_string(dir.path().join("out/initial_drawing.svg")).unwrap();
        assert_eq!(initial, "exit");
        let third = std::fs::read_to_string(dir.path().join("out/iteration_3_drawing.svg")).unwrap();
        assert_eq!(third, "<svg>y</svg>");
        assert!(store.location(ArtifactName::Initial).ends_with("initial_drawing.svg"));
    }

    #[test]
    fn test_file_store_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();
        // a directory squatting on the file name makes the write fail
        std::fs::create_dir(dir.path().join("initial_drawing.svg")).unwrap();

        let err = store.save(ArtifactName::Initial, "<svg/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailed);
        assert_eq!(err.operation(), "file_store::save");
    }
}
