//! Archive inspection
//!
//! Read-only probes over packaged modules. Every call opens and closes the
//! archive by itself; no handle is retained across the discovery window, so
//! no file lock outlives a single query. Directory-based modules are probed
//! through the filesystem directly.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open module {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read module {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

fn open(module: &Path) -> Result<ZipArchive<File>, ArchiveError> {
    let file = File::open(module).map_err(|source| ArchiveError::Open {
        path: module.to_path_buf(),
        source,
    })?;
    ZipArchive::new(file).map_err(|source| ArchiveError::Read {
        path: module.to_path_buf(),
        source,
    })
}

/// Does `entry` exist inside the module? Side-effect free.
pub fn probe(module: &Path, entry: &str) -> Result<bool, ArchiveError> {
    if module.is_dir() {
        return Ok(module.join(entry).is_file());
    }

    let archive = open(module)?;
    Ok(archive.index_for_name(entry).is_some())
}

/// First entry of `entries` present in the module, if any.
pub fn probe_any<'a>(
    module: &Path,
    entries: &'a [String],
) -> Result<Option<&'a str>, ArchiveError> {
    if module.is_dir() {
        return Ok(entries
            .iter()
            .find(|entry| module.join(entry.as_str()).is_file())
            .map(|entry| entry.as_str()));
    }

    let archive = open(module)?;
    Ok(entries
        .iter()
        .find(|entry| archive.index_for_name(entry).is_some())
        .map(|entry| entry.as_str()))
}

/// Read one entry's bytes. `Ok(None)` means the module is readable but the
/// entry does not exist.
pub fn read_entry(module: &Path, entry: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
    if module.is_dir() {
        let path = module.join(entry);
        if !path.is_file() {
            return Ok(None);
        }
        return std::fs::read(&path).map(Some).map_err(|source| {
            ArchiveError::Open {
                path: module.to_path_buf(),
                source,
            }
        });
    }

    let mut archive = open(module)?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(ArchiveError::Read {
                path: module.to_path_buf(),
                source,
            });
        }
    };

    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)
        .map_err(|source| ArchiveError::Open {
            path: module.to_path_buf(),
            source,
        })?;
    Ok(Some(data))
}

/// Check that the module can be opened at all, without reading anything.
pub fn validate(module: &Path) -> Result<(), ArchiveError> {
    if module.is_dir() {
        return Ok(());
    }
    open(module).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fixtures::write_module;

    #[test]
    fn test_probe_present_and_absent() {
        let module = write_module("probe", &[("a/b/C.class", b"xx")]);

        assert!(probe(&module, "a/b/C.class").unwrap());
        assert!(!probe(&module, "a/b/D.class").unwrap());
    }

    #[test]
    fn test_probe_unreadable_module_is_an_error() {
        let missing = PathBuf::from("/nonexistent/loadstone/missing.jar");
        assert!(probe(&missing, "whatever").is_err());
    }

    #[test]
    fn test_probe_any_returns_first_match() {
        let module = write_module("probe-any", &[("second", b"2")]);
        let entries = vec!["first".to_string(), "second".to_string()];

        assert_eq!(probe_any(&module, &entries).unwrap(), Some("second"));
    }

    #[test]
    fn test_read_entry_missing_is_none() {
        let module = write_module("read", &[("version.json", b"{}")]);

        assert_eq!(read_entry(&module, "version.json").unwrap().unwrap(), b"{}");
        assert!(read_entry(&module, "absent").unwrap().is_none());
    }

    #[test]
    fn test_directory_module_probe() {
        let dir = std::env::temp_dir().join(format!("loadstone-test-{}", fastrand::u64(..)));
        std::fs::create_dir_all(dir.join("a")).unwrap();
        std::fs::write(dir.join("a/Main.class"), b"yy").unwrap();

        assert!(probe(&dir, "a/Main.class").unwrap());
        assert!(!probe(&dir, "a/Other.class").unwrap());
        assert_eq!(read_entry(&dir, "a/Main.class").unwrap().unwrap(), b"yy");
    }
}
