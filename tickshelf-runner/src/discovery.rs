//! Source file discovery.
//!
//! Input files are named `archived_<SYMBOL>_results.csv`; anything else in
//! the directory is ignored. Files are returned sorted by name so runs are
//! reproducible.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const FILE_PREFIX: &str = "archived_";
const FILE_SUFFIX: &str = "_results.csv";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read input directory {path}: {reason}")]
    ReadDir { path: String, reason: String },
}

/// One archived file and the symbol it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub symbol: String,
}

impl SourceFile {
    /// `None` if the name does not follow the archive convention.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        let symbol = symbol_from_file_name(&file_name)?.to_string();
        Some(Self {
            path,
            file_name,
            symbol,
        })
    }
}

/// `archived_AAPL_results.csv` → `AAPL`
pub fn symbol_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)
        .filter(|symbol| !symbol.is_empty() && !symbol.contains('/'))
}

/// Archived files directly inside `dir`, sorted by file name.
pub fn discover_sources(dir: &Path) -> Result<Vec<SourceFile>, DiscoveryError> {
    let read_err = |e: std::io::Error| DiscoveryError::ReadDir {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };

    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.file_type().map_err(read_err)?.is_file() {
            continue;
        }
        match SourceFile::from_path(entry.path()) {
            Some(source) => sources.push(source),
            None => debug!(path = %entry.path().display(), "skipping non-archive file"),
        }
    }

    sources.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_parsing() {
        assert_eq!(symbol_from_file_name("archived_AAPL_results.csv"), Some("AAPL"));
        assert_eq!(symbol_from_file_name("archived_BRK_B_results.csv"), Some("BRK_B"));
        assert_eq!(symbol_from_file_name("archived__results.csv"), None);
        assert_eq!(symbol_from_file_name("AAPL_results.csv"), None);
        assert_eq!(symbol_from_file_name("archived_AAPL.csv"), None);
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "archived_MSFT_results.csv",
            "archived_AAPL_results.csv",
            "notes.txt",
            "archived_AAPL_results.csv.bak",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("archived_DIR_results.csv")).unwrap();

        let sources = discover_sources(dir.path()).unwrap();
        let symbols: Vec<&str> = sources.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(sources[0].file_name, "archived_AAPL_results.csv");
    }

    #[test]
    fn missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_sources(&dir.path().join("absent")).is_err());
    }
}
