//! Whole-file JSON documents with atomic replacement.
//!
//! A [`Document`] is read in one piece and written in one piece. Writes go to
//! a temporary file in the same directory which is synced and then renamed
//! over the target, so readers see either the old or the new contents.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

/// A JSON document on disk holding a value of type `T`.
#[derive(Debug, Clone)]
pub struct Document<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Document<T> {
    /// A document stored at `path`. Nothing is touched until it is loaded or
    /// saved.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: DeserializeOwned> Document<T> {
    /// Read and decode the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not decode as `T`.
    pub fn load(&self) -> Result<T, MalformedLocalData> {
        let file = File::open(&self.path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => MalformedLocalData::Missing {
                path: self.path.clone(),
            },
            _ => MalformedLocalData::Unreadable {
                path: self.path.clone(),
                source,
            },
        })?;

        let value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            MalformedLocalData::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        tracing::debug!("Loaded {}", self.path.display());
        Ok(value)
    }
}

impl<T: Serialize> Document<T> {
    /// Replace the document with `value`.
    ///
    /// Parent directories are created if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or the file cannot be
    /// written. The previous contents are left intact in either case.
    pub fn save(&self, value: &T) -> Result<(), SaveError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
                SaveError::Encode {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer
                .write_all(b"\n")
                .and_then(|()| writer.flush())
                .map_err(|source| self.write_error(source))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        tmp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> SaveError {
        SaveError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// A local document that could not be used.
///
/// This is never fatal: the affected collection starts out empty instead.
#[derive(Debug, thiserror::Error)]
pub enum MalformedLocalData {
    /// The document has never been written.
    #[error("{} does not exist", path.display())]
    Missing {
        /// Location of the document.
        path: PathBuf,
    },
    /// The document exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        /// Location of the document.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },
    /// The document is not valid JSON for its collection.
    #[error("{} is corrupt: {source}", path.display())]
    Corrupt {
        /// Location of the document.
        path: PathBuf,
        /// The decode failure.
        source: serde_json::Error,
    },
}

impl MalformedLocalData {
    /// Whether the document simply has not been created yet.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// A failed document write.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The value could not be encoded as JSON.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        /// Location of the document.
        path: PathBuf,
        /// The encode failure.
        source: serde_json::Error,
    },
    /// The file could not be written or moved into place.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Location of the document.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::<Vec<u32>>::new(tmp.path().join("numbers.json"));

        doc.save(&vec![1, 2, 3]).unwrap();

        assert_eq!(doc.load().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::<Vec<u32>>::new(tmp.path().join("a/b/numbers.json"));

        doc.save(&vec![4]).unwrap();

        assert!(doc.path().exists());
    }

    #[test]
    fn save_replaces_whole_document() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::<Vec<u32>>::new(tmp.path().join("numbers.json"));

        doc.save(&vec![1, 2, 3, 4, 5]).unwrap();
        doc.save(&vec![9]).unwrap();

        assert_eq!(doc.load().unwrap(), vec![9]);
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::<Vec<u32>>::new(tmp.path().join("numbers.json"));

        doc.save(&vec![1]).unwrap();
        doc.save(&vec![2]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("numbers.json")]);
    }

    #[test]
    fn load_missing_document() {
        let tmp = TempDir::new().unwrap();
        let doc = Document::<Vec<u32>>::new(tmp.path().join("absent.json"));

        let error = doc.load().unwrap_err();
        assert!(error.is_missing());
    }

    #[test]
    fn load_corrupt_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("numbers.json");
        std::fs::write(&path, "[1, 2,").unwrap();

        let error = Document::<Vec<u32>>::new(path).load().unwrap_err();
        assert!(matches!(error, MalformedLocalData::Corrupt { .. }));
    }

    #[test]
    fn failed_save_keeps_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("numbers.json");
        let doc = Document::<Vec<u32>>::new(path.clone());
        doc.save(&vec![1]).unwrap();

        // A directory can't be renamed over by a file.
        let blocked = Document::<Vec<u32>>::new(tmp.path().to_path_buf());
        assert!(blocked.save(&vec![2]).is_err());

        assert_eq!(doc.load().unwrap(), vec![1]);
    }
}
