use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shape::{renumber, Shape};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize shapes: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write shapes: {0}")]
    Io(#[from] std::io::Error),
}

/// Sink for the active shape list. Called with the full list after every
/// commit, undo and redo.
pub trait ShapeStore {
    fn save(&mut self, shapes: &[Shape]) -> Result<(), StoreError>;
}

/// Writes the list as a JSON array, replacing the file each time.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub const DEFAULT_FILE: &'static str = "savedShapes.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ShapeStore for JsonFileStore {
    fn save(&mut self, shapes: &[Shape]) -> Result<(), StoreError> {
        let mut shapes = shapes.to_vec();
        renumber(&mut shapes);
        let data = serde_json::to_string_pretty(&shapes)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps every saved list in memory, oldest first.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saves: Vec<Vec<Shape>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> &[Vec<Shape>] {
        &self.saves
    }

    pub fn last(&self) -> Option<&[Shape]> {
        self.saves.last().map(Vec::as_slice)
    }
}

impl ShapeStore for MemoryStore {
    fn save(&mut self, shapes: &[Shape]) -> Result<(), StoreError> {
        self.saves.push(shapes.to_vec());
        Ok(())
    }
}
