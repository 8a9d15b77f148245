//! JSON file persistence for collections, enrichments and reports.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Write `data` as pretty-printed JSON (two-space indent), replacing any
/// existing file. Missing parent directories are created.
pub async fn persist_json<T>(data: &T, path: &Path) -> Result<(), PersistenceError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(data).map_err(|source| PersistenceError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PersistenceError::Write {
                path: path.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(path, json)
        .await
        .map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

/// Read and deserialize a JSON document.
pub async fn load_json<T>(path: &Path) -> Result<T, PersistenceError>
where
    T: DeserializeOwned,
{
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::EnrichmentRecord;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_creates_dirs_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");

        persist_json(&vec![1, 2, 3], &path).await.unwrap();
        persist_json(&vec![EnrichmentRecord::empty("1", "Red")], &path)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n  {\n    \"id\": \"1\""));
        assert!(content.contains("\"texture\": null"));

        let loaded: Vec<EnrichmentRecord> = load_json(&path).await.unwrap();
        assert_eq!(loaded, vec![EnrichmentRecord::empty("1", "Red")]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_json::<Vec<u8>>(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Read { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();
        let err = load_json::<Vec<EnrichmentRecord>>(&path).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Parse { .. }));
    }
}
