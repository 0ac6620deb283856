use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;
use weft_graph::Graph;

use crate::error::SnapshotError;

/// Persistence for the graph document.
pub trait Snapshot: Send {
  /// Load the last saved graph, if any.
  fn load(&self) -> Result<Option<Graph>, SnapshotError>;

  /// Save the full graph, replacing the previous snapshot.
  fn save(&mut self, graph: &Graph) -> Result<(), SnapshotError>;
}

/// Snapshot stored as a JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
  path: PathBuf,
}

impl FileSnapshot {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Snapshot for FileSnapshot {
  fn load(&self) -> Result<Option<Graph>, SnapshotError> {
    if !self.path.exists() {
      return Ok(None);
    }

    let content = std::fs::read_to_string(&self.path)?;
    let graph = Graph::from_json(&content)?;
    debug!(
      path = %self.path.display(),
      nodes = graph.nodes.len(),
      edges = graph.edges.len(),
      "snapshot_loaded"
    );
    Ok(Some(graph))
  }

  fn save(&mut self, graph: &Graph) -> Result<(), SnapshotError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, graph.to_json()?)?;
    std::fs::rename(&tmp, &self.path)?;

    debug!(
      path = %self.path.display(),
      nodes = graph.nodes.len(),
      edges = graph.edges.len(),
      "snapshot_saved"
    );
    Ok(())
  }
}

/// In-memory snapshot.
///
/// Clones share the same slot, so a test can hand one clone to a store and
/// inspect what was saved through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
  inner: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
  graph: Option<Graph>,
  saves: usize,
}

impl MemorySnapshot {
  pub fn new() -> Self {
    Self::default()
  }

  /// A snapshot that already holds a graph.
  pub fn with_graph(graph: Graph) -> Self {
    Self {
      inner: Arc::new(Mutex::new(MemorySlot {
        graph: Some(graph),
        saves: 0,
      })),
    }
  }

  /// The most recently saved graph.
  pub fn saved(&self) -> Option<Graph> {
    let slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    slot.graph.clone()
  }

  /// Number of saves performed.
  pub fn save_count(&self) -> usize {
    let slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    slot.saves
  }
}

impl Snapshot for MemorySnapshot {
  fn load(&self) -> Result<Option<Graph>, SnapshotError> {
    Ok(self.saved())
  }

  fn save(&mut self, graph: &Graph) -> Result<(), SnapshotError> {
    let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    slot.graph = Some(graph.clone());
    slot.saves += 1;
    Ok(())
  }
}
