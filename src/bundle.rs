//! Persisted rule bundle I/O.
//!
//! A rule bundle is a single-entry zip archive wrapping one JSON
//! document with `packages` and `rules` top-level fields. Load reads the
//! archive, deserializes the single entry into JSON, and builds the
//! domain type from it; save is the inverse.

use crate::rules::{RuleStore, RuleStoreError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const BUNDLE_ENTRY_NAME: &str = "rules.json";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("failed to read bundle {path}: {source}")]
    Io { source: std::io::Error, path: PathBuf },
    #[error("failed to read bundle archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("bundle archive at {path} has no entries")]
    Empty { path: PathBuf },
    #[error("failed to parse bundle json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bundle json did not match the expected shape: {0}")]
    Shape(#[from] RuleStoreError),
}

pub type Result<T> = std::result::Result<T, BundleError>;

/// Load a rule store from a zipped-JSON bundle on disk.
pub fn load(path: impl AsRef<Path>) -> Result<RuleStore> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| BundleError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let mut archive = ZipArchive::new(file)?;
    if archive.is_empty() {
        return Err(BundleError::Empty { path: path.to_path_buf() });
    }

    let mut entry = archive.by_index(0)?;
    let mut contents = String::new();
    entry.read_to_string(&mut contents).map_err(|source| BundleError::Io {
        source,
        path: path.to_path_buf(),
    })?;

    let doc: serde_json::Value = serde_json::from_str(&contents)?;
    Ok(RuleStore::from_json(&doc)?)
}

/// Write a rule store to a zipped-JSON bundle, the inverse of `load`.
/// Used by test fixtures and any future ingest tool.
pub fn save(store: &RuleStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| BundleError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(BUNDLE_ENTRY_NAME, options)?;
    let body = serde_json::to_vec(&store.to_json())?;
    writer.write_all(&body).map_err(|source| BundleError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn fixture_store() -> RuleStore {
        let doc = json!({
            "packages": {
                "autobahn": { "20.12.3": { "cryptography": [[">=", "2.5"]] } },
                "cryptography": { "2.9": {}, "3.0": {}, "3.4": {} }
            },
            "rules": [
                [
                    [["cryptography", ">=~", "2.0"], "and", ["cryptography", "<~", "3.3"]],
                    { "$cve": "CVE-2020-0001", "$vuln": true }
                ]
            ]
        });
        RuleStore::from_json(&doc).expect("valid fixture")
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bundle.zip");
        let store = fixture_store();

        save(&store, &path).expect("save succeeds");
        let loaded = load(&path).expect("load succeeds");

        assert_eq!(store, loaded);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let result = load("/nonexistent/path/to/bundle.zip");
        assert!(matches!(result, Err(BundleError::Io { .. })));
    }

    #[test]
    fn empty_archive_is_rejected() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty.zip");
        let file = File::create(&path).expect("create");
        let writer = ZipWriter::new(file);
        writer.finish().expect("finish empty archive");

        assert!(matches!(load(&path), Err(BundleError::Empty { .. })));
    }
}
