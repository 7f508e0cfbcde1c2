use std::fs;
use std::path::{Path, PathBuf};

use bayplan_core::catalog::{CatalogProvider, InMemoryCatalog};
use bayplan_core::snapshot::Snapshot;
use thiserror::Error;
use tracing::info;

pub mod catalog_csv;
pub mod snapshot_json;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

pub trait CatalogLoader {
    fn load(&self, path: &Path) -> Result<InMemoryCatalog, IoError>;
}

pub trait SnapshotLoader {
    fn load(&self, path: &Path) -> Result<Snapshot, IoError>;
}

pub trait SnapshotSaver {
    fn save(&self, snapshot: &Snapshot, path: &Path) -> Result<(), IoError>;
}

/// 从 CSV 文件读取产品目录。
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvCatalogFacade;

impl CsvCatalogFacade {
    pub fn new() -> Self {
        Self
    }
}

impl CatalogLoader for CsvCatalogFacade {
    fn load(&self, path: &Path) -> Result<InMemoryCatalog, IoError> {
        let data = read(path)?;
        let catalog = catalog_csv::parse_catalog(&data);
        info!(path = %path.display(), entries = catalog.len(), "catalog file loaded");
        Ok(catalog)
    }
}

/// 以 JSON 读写单个布局快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotFacade;

impl JsonSnapshotFacade {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotLoader for JsonSnapshotFacade {
    fn load(&self, path: &Path) -> Result<Snapshot, IoError> {
        let data = read(path)?;
        snapshot_json::decode(&data)
    }
}

impl SnapshotSaver for JsonSnapshotFacade {
    fn save(&self, snapshot: &Snapshot, path: &Path) -> Result<(), IoError> {
        let data = snapshot_json::encode(snapshot)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), tires = snapshot.tires().len(), "snapshot saved");
        Ok(())
    }
}

fn read(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
