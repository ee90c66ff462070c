//! Durable `(collection, id) -> (vector, metadata)` store.
//!
//! Records are appended as checksummed frames to a single log file. An
//! in-memory key directory maps each live identity to the offset of its latest
//! frame; values are always read back from disk, so a scan reflects every put
//! that completed before it started.
//!
//! On open the log is replayed front to back. A frame cut short at the end of
//! the file (an interrupted append) is truncated away; damage anywhere else is
//! reported as [`Error::Corrupted`].

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::frame::{self, ReadOutcome, StoredRecord};
use crate::config::{StoreConfig, SyncMode};
use crate::error::{Error, Result};
use crate::vector::VectorRecord;

/// On-disk format written by this version.
pub const FORMAT_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";
const LOG_FILE: &str = "vectors.log";
const COMPACT_FILE: &str = "vectors.log.compact";

/// Store metadata, persisted as `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreMeta {
    format_version: u32,
    created_at: String,
}

/// Live identities of one collection.
#[derive(Debug, Default)]
struct CollectionKeys {
    by_id: HashMap<String, u64>,
    /// Same entries keyed by offset; iteration order is write order.
    by_offset: BTreeMap<u64, String>,
}

#[derive(Debug, Default)]
struct KeyDirectory {
    collections: HashMap<String, CollectionKeys>,
}

impl KeyDirectory {
    fn insert(&mut self, collection: &str, id: &str, offset: u64) {
        let keys = self.collections.entry(collection.to_owned()).or_default();
        if let Some(previous) = keys.by_id.insert(id.to_owned(), offset) {
            keys.by_offset.remove(&previous);
        }
        keys.by_offset.insert(offset, id.to_owned());
    }

    fn len(&self) -> usize {
        self.collections.values().map(|keys| keys.by_id.len()).sum()
    }
}

struct Inner {
    log: File,
    write_pos: u64,
    unsynced: usize,
    keys: KeyDirectory,
}

/// Outcome of [`DurableStore::compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionStats {
    pub live_records: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

/// Persistent record store with last-write-wins semantics.
///
/// Safe to share across threads: puts are serialized behind a write lock and
/// scans run concurrently under a read lock. A frame becomes visible to scans
/// only after it has been written in full.
///
/// # Example
///
/// ```no_run
/// use embedvault_core::storage::DurableStore;
/// use embedvault_core::{StoreConfig, VectorRecord};
///
/// let store = DurableStore::open(StoreConfig::new("./vectors")).unwrap();
/// store.put("docs", &VectorRecord::new("a", vec![1.0, 0.0])).unwrap();
///
/// let records = store.scan("docs").unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub struct DurableStore {
    root: PathBuf,
    config: StoreConfig,
    inner: RwLock<Inner>,
}

impl DurableStore {
    /// Opens the store at `config.path`, creating it if needed.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let root = config.path.clone();
        fs::create_dir_all(&root)
            .map_err(|e| Error::Storage(format!("create store dir failed: {}", e)))?;

        load_or_create_meta(&root.join(META_FILE))?;

        let log_path = root.join(LOG_FILE);
        let log = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| Error::Storage(format!("failed to open log: {}", e)))?;

        let (keys, valid_len) = replay(&log_path)?;

        let on_disk = file_len(&log)?;
        if valid_len < on_disk {
            warn!(
                path = %log_path.display(),
                valid_len,
                on_disk,
                "truncating incomplete record at end of log"
            );
            log.set_len(valid_len)
                .map_err(|e| Error::Storage(format!("truncate torn tail failed: {}", e)))?;
            log.sync_all()
                .map_err(|e| Error::Storage(format!("sync failed: {}", e)))?;
        }

        info!(
            path = %root.display(),
            records = keys.len(),
            collections = keys.collections.len(),
            "opened vector store"
        );

        Ok(Self {
            root,
            config,
            inner: RwLock::new(Inner {
                log,
                write_pos: valid_len,
                unsynced: 0,
                keys,
            }),
        })
    }

    /// Inserts or replaces the record stored under `(collection, record.id)`.
    ///
    /// The record is published only after its frame is written and, when the
    /// sync mode calls for it, synced. If either step fails the frame is cut
    /// from the log again, so an `Err` always means the record was not stored.
    pub fn put(&self, collection: &str, record: &VectorRecord) -> Result<()> {
        if collection.is_empty() {
            return Err(Error::InvalidRecord("collection name is empty".into()));
        }
        if record.id.is_empty() {
            return Err(Error::InvalidRecord("record id is empty".into()));
        }

        let bytes = frame::encode(collection, record)?;

        let mut inner = self.inner.write();
        let offset = inner.write_pos;

        if let Err(e) = inner.log.write_all(&bytes) {
            rollback_append(&mut inner, offset);
            return Err(Error::Storage(format!("write record failed: {}", e)));
        }

        let sync_due = match self.config.sync_mode {
            SyncMode::Immediate => true,
            SyncMode::Batched => inner.unsynced + 1 >= self.config.sync_batch,
            SyncMode::NoSync => false,
        };
        if sync_due {
            if let Err(e) = inner.log.sync_data() {
                rollback_append(&mut inner, offset);
                return Err(Error::Storage(format!("sync failed: {}", e)));
            }
            inner.unsynced = 0;
        } else {
            inner.unsynced += 1;
        }

        inner.write_pos = offset + bytes.len() as u64;
        inner.keys.insert(collection, &record.id, offset);
        Ok(())
    }

    /// Returns every record stored under `collection`, oldest write first.
    ///
    /// An unknown collection yields an empty vector.
    pub fn scan(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let inner = self.inner.read();
        let Some(keys) = inner.keys.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut reader = LogReader::open(&self.log_path(), inner.write_pos)?;
        let mut records = Vec::with_capacity(keys.by_offset.len());
        for (&offset, id) in &keys.by_offset {
            let stored = reader.read_at(offset)?;
            check_identity(&stored, collection, id, offset)?;
            records.push(stored.record);
        }

        debug!(collection, records = records.len(), "scanned collection");
        Ok(records)
    }

    /// Returns the record stored under `(collection, id)`, if any.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<VectorRecord>> {
        let inner = self.inner.read();
        let Some(&offset) = inner
            .keys
            .collections
            .get(collection)
            .and_then(|keys| keys.by_id.get(id))
        else {
            return Ok(None);
        };

        let stored = LogReader::open(&self.log_path(), inner.write_pos)?.read_at(offset)?;
        check_identity(&stored, collection, id, offset)?;
        Ok(Some(stored.record))
    }

    /// Returns the names of all collections holding at least one record, sorted.
    pub fn collections(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner.keys.collections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the ids stored under `collection`, oldest write first.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        let inner = self.inner.read();
        inner
            .keys
            .collections
            .get(collection)
            .map(|keys| keys.by_offset.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of live records in `collection`.
    pub fn collection_len(&self, collection: &str) -> usize {
        let inner = self.inner.read();
        inner
            .keys
            .collections
            .get(collection)
            .map_or(0, |keys| keys.by_id.len())
    }

    /// Returns the number of live records across all collections.
    pub fn len(&self) -> usize {
        self.inner.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forces all appended records to stable storage.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.write();
        inner
            .log
            .sync_all()
            .map_err(|e| Error::Storage(format!("sync failed: {}", e)))?;
        inner.unsynced = 0;
        Ok(())
    }

    /// Rewrites the log so it holds only the latest frame of each identity.
    ///
    /// Runs only when called. Write order within each collection is kept, so
    /// scan order and query tie-breaks are unchanged. Blocks puts and scans
    /// while it runs.
    pub fn compact(&self) -> Result<CompactionStats> {
        let mut inner = self.inner.write();
        let log_path = self.log_path();
        let tmp_path = self.root.join(COMPACT_FILE);
        let bytes_before = inner.write_pos;

        let mut live: Vec<(u64, String, String)> = inner
            .keys
            .collections
            .iter()
            .flat_map(|(collection, keys)| {
                keys.by_offset
                    .iter()
                    .map(move |(&offset, id)| (offset, collection.clone(), id.clone()))
            })
            .collect();
        live.sort_unstable_by_key(|(offset, _, _)| *offset);

        let mut reader = LogReader::open(&log_path, inner.write_pos)?;
        let tmp = File::create(&tmp_path)
            .map_err(|e| Error::Storage(format!("create compaction file failed: {}", e)))?;
        let mut writer = BufWriter::new(tmp);
        let mut keys = KeyDirectory::default();
        let mut pos = 0u64;

        for (offset, collection, id) in &live {
            let stored = reader.read_at(*offset)?;
            check_identity(&stored, collection, id, *offset)?;
            let bytes = frame::encode(collection, &stored.record)?;
            writer
                .write_all(&bytes)
                .map_err(|e| Error::Storage(format!("write compacted record failed: {}", e)))?;
            keys.insert(collection, id, pos);
            pos += bytes.len() as u64;
        }

        let tmp = writer
            .into_inner()
            .map_err(|e| Error::Storage(format!("flush compaction file failed: {}", e)))?;
        tmp.sync_all()
            .map_err(|e| Error::Storage(format!("sync failed: {}", e)))?;
        drop(tmp);

        // Take the handle before the rename: once the new file replaces the
        // log, nothing can fail before the store switches over to it.
        let compacted = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&tmp_path)
            .map_err(|e| Error::Storage(format!("open compacted log failed: {}", e)))?;
        fs::rename(&tmp_path, &log_path)
            .map_err(|e| Error::Storage(format!("replace log failed: {}", e)))?;

        inner.log = compacted;
        inner.write_pos = pos;
        inner.unsynced = 0;
        inner.keys = keys;

        let stats = CompactionStats {
            live_records: live.len(),
            bytes_before,
            bytes_after: pos,
        };
        info!(
            live_records = stats.live_records,
            bytes_before, bytes_after = pos, "compacted vector log"
        );
        Ok(stats)
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration the store was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("root", &self.root)
            .field("records", &self.len())
            .finish()
    }
}

/// Sequential reader over the log, used for scans and compaction.
///
/// Offsets must be requested in ascending order so buffered data is reused.
struct LogReader {
    reader: BufReader<File>,
    pos: u64,
    end: u64,
}

impl LogReader {
    fn open(path: &Path, end: u64) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::Storage(format!("open log for read failed: {}", e)))?;
        Ok(Self {
            reader: BufReader::new(file),
            pos: 0,
            end,
        })
    }

    fn read_at(&mut self, offset: u64) -> Result<StoredRecord> {
        if offset >= self.pos {
            self.reader
                .seek_relative((offset - self.pos) as i64)
                .map_err(|e| Error::Storage(format!("seek failed: {}", e)))?;
        } else {
            self.reader
                .seek(SeekFrom::Start(offset))
                .map_err(|e| Error::Storage(format!("seek failed: {}", e)))?;
        }
        self.pos = offset;

        match frame::read_frame(&mut self.reader, offset, self.end.saturating_sub(offset))? {
            ReadOutcome::Frame { stored, frame_len } => {
                self.pos = offset + frame_len;
                Ok(stored)
            }
            ReadOutcome::End | ReadOutcome::Torn => Err(Error::Corrupted {
                offset,
                reason: "record truncated".into(),
            }),
            ReadOutcome::BadChecksum { .. } => Err(Error::Corrupted {
                offset,
                reason: "checksum mismatch".into(),
            }),
        }
    }
}

/// Cuts an unpublished frame starting at `offset` from the end of the log.
fn rollback_append(inner: &mut Inner, offset: u64) {
    match inner.log.set_len(offset) {
        Ok(()) => inner.write_pos = offset,
        Err(e) => {
            // The frame stays on disk and will be replayed on the next open.
            warn!(offset, error = %e, "failed to roll back unpublished record");
            inner.write_pos = file_len(&inner.log).unwrap_or(offset);
        }
    }
}

fn check_identity(stored: &StoredRecord, collection: &str, id: &str, offset: u64) -> Result<()> {
    if stored.collection != collection || stored.record.id != id {
        return Err(Error::Corrupted {
            offset,
            reason: format!(
                "expected {}/{}, found {}/{}",
                collection, id, stored.collection, stored.record.id
            ),
        });
    }
    Ok(())
}

fn file_len(file: &File) -> Result<u64> {
    Ok(file
        .metadata()
        .map_err(|e| Error::Storage(format!("metadata failed: {}", e)))?
        .len())
}

fn load_or_create_meta(path: &Path) -> Result<StoreMeta> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("read meta failed: {}", e)))?;
        let meta: StoreMeta = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("parse meta failed: {}", e)))?;
        if meta.format_version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat {
                expected: FORMAT_VERSION,
                found: meta.format_version,
            });
        }
        return Ok(meta);
    }

    let meta = StoreMeta {
        format_version: FORMAT_VERSION,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    let content = serde_json::to_string_pretty(&meta)?;
    fs::write(path, content).map_err(|e| Error::Storage(format!("write meta failed: {}", e)))?;
    Ok(meta)
}

/// Rebuilds the key directory from the log.
///
/// Returns the directory and the length of the valid prefix of the log.
fn replay(path: &Path) -> Result<(KeyDirectory, u64)> {
    let file =
        File::open(path).map_err(|e| Error::Storage(format!("open log for replay failed: {}", e)))?;
    let len = file_len(&file)?;
    let mut reader = BufReader::new(file);
    let mut keys = KeyDirectory::default();
    let mut offset = 0u64;

    loop {
        match frame::read_frame(&mut reader, offset, len - offset)? {
            ReadOutcome::Frame { stored, frame_len } => {
                keys.insert(&stored.collection, &stored.record.id, offset);
                offset += frame_len;
            }
            ReadOutcome::End => break,
            ReadOutcome::Torn => {
                check_torn_tail(path, offset)?;
                break;
            }
            // A bad frame that runs exactly to the end is an append that never
            // finished; anything earlier is damage.
            ReadOutcome::BadChecksum { frame_len } if offset + frame_len == len => break,
            ReadOutcome::BadChecksum { .. } => {
                return Err(Error::Corrupted {
                    offset,
                    reason: "checksum mismatch".into(),
                })
            }
        }
    }

    Ok((keys, offset))
}

/// Fails if the bytes from `offset` to the end of the log hold a complete
/// frame, which an interrupted append cannot have left behind.
fn check_torn_tail(path: &Path, offset: u64) -> Result<()> {
    let mut file =
        File::open(path).map_err(|e| Error::Storage(format!("open log for replay failed: {}", e)))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| Error::Storage(format!("seek failed: {}", e)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)
        .map_err(|e| Error::Storage(format!("read log tail failed: {}", e)))?;

    if frame::contains_frame(&tail[1.min(tail.len())..]) {
        return Err(Error::Corrupted {
            offset,
            reason: "record length runs past end of log but intact records follow".into(),
        });
    }
    Ok(())
}
