use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use log::debug;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::file_lock::FileLock;
use crate::storage::store::DupStore;

const MAGIC: [u8; 4] = *b"FZGM";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    version: u32,
    created_at: DateTime<Utc>,
    checksum: u32,
}

/// Disk-backed ordered duplicate-key store, one file per store.
///
/// The ordered map is held in memory; `sync` serializes it behind a
/// checksummed header and renames over the target, so a crash mid-write
/// never clobbers the previous state. Read-only opens map the file
/// instead of reading it into a buffer.
#[derive(Debug)]
pub struct DiskStore {
    path: PathBuf,
    entries: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
    created_at: DateTime<Utc>,
    read_only: bool,
    dirty: bool,
    buf_capacity: usize,
    _lock: Option<FileLock>,
}

impl DiskStore {
    pub fn open(path: &Path, read_only: bool, buf_capacity: usize) -> Result<Self> {
        if !path.exists() {
            if read_only {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("store file {} does not exist", path.display()),
                ));
            }
            let lock = FileLock::acquire(&lock_path(path))?;
            debug!("created store {}", path.display());
            return Ok(DiskStore {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
                created_at: Utc::now(),
                read_only,
                dirty: true,
                buf_capacity,
                _lock: Some(lock),
            });
        }

        let (entries, created_at) = if read_only {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            Self::load(path, &mmap)?
        } else {
            let data = fs::read(path)?;
            Self::load(path, &data)?
        };

        let lock = if read_only {
            None
        } else {
            Some(FileLock::acquire(&lock_path(path))?)
        };

        debug!("opened store {} ({} keys)", path.display(), entries.len());
        Ok(DiskStore {
            path: path.to_path_buf(),
            entries,
            created_at,
            read_only,
            dirty: false,
            buf_capacity,
            _lock: lock,
        })
    }

    fn load(path: &Path, data: &[u8]) -> Result<(BTreeMap<Vec<u8>, Vec<Vec<u8>>>, DateTime<Utc>)> {
        if data.len() < 4 {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("store {} truncated", path.display()),
            ));
        }
        let header_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let body_start = 4 + header_len;
        if data.len() < body_start {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("store {} truncated header", path.display()),
            ));
        }
        let header: StoreHeader = bincode::deserialize(&data[4..body_start])?;
        if header.magic != MAGIC || header.version != VERSION {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("store {} has unknown format", path.display()),
            ));
        }

        let body = &data[body_start..];
        let mut hasher = Hasher::new();
        hasher.update(body);
        if hasher.finalize() != header.checksum {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("store {} checksum mismatch", path.display()),
            ));
        }

        let entries = bincode::deserialize(body)?;
        Ok((entries, header.created_at))
    }

    fn check_writable(&self, key: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(Error::new(
                ErrorKind::ReadOnly,
                format!(
                    "store {} opened read-only (key {:?})",
                    self.path.display(),
                    String::from_utf8_lossy(key)
                ),
            ));
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(path: &Path) -> PathBuf {
    append_suffix(path, ".lock")
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

impl DupStore for DiskStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).and_then(|vs| vs.first().cloned())
    }

    fn dup_values(&self, key: &[u8]) -> Vec<Vec<u8>> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    fn put_dup(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        self.entries
            .entry(key.to_vec())
            .or_default()
            .push(value.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn set_meta(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        self.entries.insert(key.to_vec(), vec![value.to_vec()]);
        self.dirty = true;
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> Result<()> {
        self.check_writable(key)?;
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    fn scan_from<'a>(&'a self, key: &[u8]) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a> {
        Box::new(
            self.entries
                .range(key.to_vec()..)
                .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_slice(), v.as_slice()))),
        )
    }

    fn sync(&mut self) -> Result<()> {
        if self.read_only || !self.dirty {
            return Ok(());
        }

        let body = bincode::serialize(&self.entries)?;
        let mut hasher = Hasher::new();
        hasher.update(&body);
        let header = StoreHeader {
            magic: MAGIC,
            version: VERSION,
            created_at: self.created_at,
            checksum: hasher.finalize(),
        };
        let header_bytes = bincode::serialize(&header)?;

        let tmp = append_suffix(&self.path, ".tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::with_capacity(self.buf_capacity.max(512), file);
        writer.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
        writer.write_all(&header_bytes)?;
        writer.write_all(&body)?;
        let file = writer
            .into_inner()
            .map_err(|e| Error::from(e.into_error()))?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;

        self.dirty = false;
        debug!("synced store {} ({} bytes)", self.path.display(), body.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_a_sync_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");

        let mut store = DiskStore::open(&path, false, 4096).unwrap();
        store.put_dup(b"k", b"one").unwrap();
        store.put_dup(b"k", b"two").unwrap();
        store.set_meta(b"_meta", b"42").unwrap();
        store.sync().unwrap();
        drop(store);

        let store = DiskStore::open(&path, false, 4096).unwrap();
        assert_eq!(store.dup_values(b"k"), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(store.get_meta(b"_meta").unwrap(), b"42");
    }

    #[test]
    fn read_only_open_requires_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let err = DiskStore::open(&path, true, 4096).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn read_only_handles_reject_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");

        let mut store = DiskStore::open(&path, false, 4096).unwrap();
        store.put_dup(b"k", b"v").unwrap();
        store.sync().unwrap();
        drop(store);

        let mut store = DiskStore::open(&path, true, 4096).unwrap();
        assert_eq!(store.get(b"k").unwrap(), b"v");
        let err = store.put_dup(b"k", b"w").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReadOnly);
    }

    #[test]
    fn flipped_bytes_fail_the_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");

        let mut store = DiskStore::open(&path, false, 4096).unwrap();
        store.put_dup(b"key", b"value-bytes").unwrap();
        store.sync().unwrap();
        drop(store);

        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        fs::write(&path, &data).unwrap();

        let err = DiskStore::open(&path, false, 4096).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Corrupt);
    }

    #[test]
    fn sync_without_changes_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store");

        let mut store = DiskStore::open(&path, false, 4096).unwrap();
        store.put_dup(b"k", b"v").unwrap();
        store.sync().unwrap();
        let modified = fs::metadata(&path).unwrap().modified().unwrap();
        store.sync().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
    }
}
