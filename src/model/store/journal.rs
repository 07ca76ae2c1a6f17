use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from the persistence layer. `Corrupt` is the fatal kind: a
/// journal or dataset whose contents violate an invariant must halt startup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("malformed record at {path}:{line}: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error("failed to encode journal record: {0}")]
    Encode(serde_json::Error),
    #[error("store corruption detected: {0}")]
    Corrupt(String),
}

/// A type that can be persisted to its own append-only journal.
pub trait JournalRecord: Serialize + DeserializeOwned {
    /// Base name of the journal file, without extension.
    const NAME: &'static str;
}

/// An append-only journal of JSON lines, one file per record type.
///
/// Opening a journal replays every existing line so the caller can rebuild
/// in-memory state, then holds the file open in append mode. Records are
/// flushed on every append; nothing is ever rewritten in place except via
/// explicit tombstone records defined by the record type itself.
#[derive(Debug)]
pub struct Journal<T> {
    path: PathBuf,
    file: File,
    _marker: PhantomData<T>,
}

impl<T: JournalRecord> Journal<T> {
    /// Open (creating if needed) the journal under `dir`, returning the
    /// journal handle and every record replayed from disk in order.
    pub fn open(dir: &Path) -> Result<(Self, Vec<T>), StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{}.jsonl", T::NAME));

        let mut records = Vec::new();
        if path.exists() {
            let file = File::open(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            for (index, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|source| StoreError::Io {
                    path: path.clone(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let record =
                    serde_json::from_str(&line).map_err(|source| StoreError::Malformed {
                        path: path.clone(),
                        line: index + 1,
                        source,
                    })?;
                records.push(record);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        Ok((
            Self {
                path,
                file,
                _marker: PhantomData,
            },
            records,
        ))
    }

    /// Append one record and flush it to disk.
    pub fn append(&mut self, record: &T) -> Result<(), StoreError> {
        let line = serde_json::to_string(record).map_err(StoreError::Encode)?;
        let write = writeln!(self.file, "{line}").and_then(|_| self.file.flush());
        write.map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        n: u32,
    }

    impl JournalRecord for Entry {
        const NAME: &'static str = "entries";
    }

    #[test]
    fn append_then_replay() {
        let dir = TempDir::new().unwrap();

        {
            let (mut journal, existing) = Journal::<Entry>::open(dir.path()).unwrap();
            assert!(existing.is_empty());
            journal.append(&Entry { n: 1 }).unwrap();
            journal.append(&Entry { n: 2 }).unwrap();
        }

        let (_, replayed) = Journal::<Entry>::open(dir.path()).unwrap();
        assert_eq!(replayed, vec![Entry { n: 1 }, Entry { n: 2 }]);
    }

    #[test]
    fn garbage_line_is_malformed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("entries.jsonl"), "{\"n\":1}\nnot json\n").unwrap();
        let err = Journal::<Entry>::open(dir.path()).unwrap_err();
        match err {
            StoreError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_lines_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("entries.jsonl"), "{\"n\":1}\n\n{\"n\":2}\n").unwrap();
        let (_, replayed) = Journal::<Entry>::open(dir.path()).unwrap();
        assert_eq!(replayed.len(), 2);
    }
}
