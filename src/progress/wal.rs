//! Write-ahead log backed progress store.
//!
//! Every checkpoint write is appended to a single log file as one framed
//! record and synced before [`ProgressLog::log`] returns:
//!
//! ```text
//! [length: u32 LE][crc32: u32 LE][JSON record]
//! ```
//!
//! Opening the log replays the file in order to rebuild the in-memory view.
//! A torn final record (the process died mid-append) is dropped and the file
//! is rewritten without it, so later appends stay readable.
//!
//! Replaced entries stay on disk until the log is compacted. Once the file
//! holds at least [`WAL_COMPACTION_THRESHOLD`] records and at least twice as
//! many records as there are live entries, it is rewritten atomically with
//! only the live entries, keeping their sequence numbers.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};
use crate::progress::{Checkpoint, CheckpointValue, ProgressLog, WriteMode, check_kind};
use crate::storage::{Storage, StorageOutput, write_atomic};

/// Default name of the progress log file.
pub const PROGRESS_LOG_FILE: &str = "progress.wal";

const HEADER_LEN: usize = 8;

#[cfg(test)]
pub const WAL_COMPACTION_THRESHOLD: usize = 4;
#[cfg(not(test))]
pub const WAL_COMPACTION_THRESHOLD: usize = 64;

pub type SeqNumber = u64;

/// A single checkpoint write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalRecord {
    pub seq: SeqNumber,
    pub checkpoint: Checkpoint,
    pub value: CheckpointValue,
    pub mode: WriteMode,
    pub recorded_at: DateTime<Utc>,
}

/// One retained entry of a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointEntry {
    pub seq: SeqNumber,
    pub value: CheckpointValue,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct WalState {
    entries: BTreeMap<Checkpoint, Vec<CheckpointEntry>>,
    next_seq: SeqNumber,
    /// Records in the log file, live or replaced.
    records_on_disk: usize,
    writer: Option<Box<dyn StorageOutput>>,
}

impl WalState {
    fn apply(&mut self, record: &WalRecord) {
        let entry = CheckpointEntry {
            seq: record.seq,
            value: record.value,
            recorded_at: record.recorded_at,
        };
        let entries = self.entries.entry(record.checkpoint).or_default();
        if record.mode == WriteMode::Replace {
            entries.clear();
        }
        entries.push(entry);
        self.next_seq = self.next_seq.max(record.seq + 1);
    }

    fn live_entries(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    fn needs_compaction(&self) -> bool {
        self.records_on_disk >= WAL_COMPACTION_THRESHOLD
            && self.records_on_disk >= 2 * self.live_entries()
    }

    /// The live entries as records in sequence order. The first entry of
    /// each checkpoint replaces, the rest update.
    fn live_records(&self) -> Vec<WalRecord> {
        let mut records: Vec<WalRecord> = self
            .entries
            .iter()
            .flat_map(|(checkpoint, entries)| {
                entries.iter().enumerate().map(|(index, entry)| WalRecord {
                    seq: entry.seq,
                    checkpoint: *checkpoint,
                    value: entry.value,
                    mode: if index == 0 {
                        WriteMode::Replace
                    } else {
                        WriteMode::Update
                    },
                    recorded_at: entry.recorded_at,
                })
            })
            .collect();
        records.sort_by_key(|record| record.seq);
        records
    }
}

/// A [`ProgressLog`] persisted as an append-only record file.
#[derive(Debug)]
pub struct WalProgressLog {
    storage: Arc<dyn Storage>,
    path: String,
    state: Mutex<WalState>,
}

impl WalProgressLog {
    /// Open (or create) the log stored under [`PROGRESS_LOG_FILE`].
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        Self::open_at(storage, PROGRESS_LOG_FILE)
    }

    /// Open (or create) the log stored under `path`.
    pub fn open_at(storage: Arc<dyn Storage>, path: &str) -> Result<Self> {
        let log = WalProgressLog {
            storage,
            path: path.to_string(),
            state: Mutex::new(WalState {
                next_seq: 1,
                ..Default::default()
            }),
        };
        log.replay()?;
        Ok(log)
    }

    /// Every checkpoint that has at least one entry, with its latest entry.
    pub fn snapshot(&self) -> Vec<(Checkpoint, CheckpointEntry)> {
        let state = self.state.lock();
        state
            .entries
            .iter()
            .filter_map(|(checkpoint, entries)| {
                entries.last().map(|entry| (*checkpoint, entry.clone()))
            })
            .collect()
    }

    /// The sequence number of the last record written or replayed.
    pub fn last_seq(&self) -> SeqNumber {
        self.state.lock().next_seq - 1
    }

    fn replay(&self) -> Result<()> {
        if !self.storage.file_exists(&self.path) {
            return Ok(());
        }

        let (records, torn) = self.read_records()?;
        let mut state = self.state.lock();
        for record in &records {
            state.apply(record);
        }
        state.records_on_disk = records.len();
        debug!("Replayed {} progress records from {}", records.len(), self.path);

        if torn {
            warn!(
                "Dropping torn trailing record in {}; keeping {} records",
                self.path,
                records.len()
            );
        }
        if torn || state.needs_compaction() {
            self.compact(&mut state)?;
        }

        Ok(())
    }

    /// Rewrite the log file with only the live entries.
    fn compact(&self, state: &mut WalState) -> Result<()> {
        let records = state.live_records();
        let mut bytes = Vec::new();
        for record in &records {
            bytes.extend_from_slice(&encode_record(record)?);
        }

        state.writer = None;
        write_atomic(self.storage.as_ref(), &self.path, &bytes)?;
        debug!(
            "Compacted {}: {} records down to {}",
            self.path,
            state.records_on_disk,
            records.len()
        );
        state.records_on_disk = records.len();
        Ok(())
    }

    /// Read all complete records. The flag is true when trailing bytes had
    /// to be discarded.
    fn read_records(&self) -> Result<(Vec<WalRecord>, bool)> {
        let mut reader = self.storage.open_input(&self.path)?;
        let size = reader.size()? as usize;
        let mut buffer = Vec::with_capacity(size);
        reader.read_to_end(&mut buffer)?;

        let mut records = Vec::new();
        let mut position = 0;

        while position < buffer.len() {
            if position + HEADER_LEN > buffer.len() {
                return Ok((records, true));
            }
            let len = u32::from_le_bytes(read_u32(&buffer, position)) as usize;
            let checksum = u32::from_le_bytes(read_u32(&buffer, position + 4));
            let body_start = position + HEADER_LEN;

            if body_start + len > buffer.len() {
                return Ok((records, true));
            }
            let body = &buffer[body_start..body_start + len];
            if crc32fast::hash(body) != checksum {
                if body_start + len == buffer.len() {
                    return Ok((records, true));
                }
                return Err(PhalanxError::checkpoint(format!(
                    "Checksum mismatch in {} at byte {position}",
                    self.path
                )));
            }

            records.push(serde_json::from_slice(body)?);
            position = body_start + len;
        }

        Ok((records, false))
    }
}

impl ProgressLog for WalProgressLog {
    fn get(&self, checkpoint: Checkpoint) -> Result<Option<CheckpointValue>> {
        let state = self.state.lock();
        Ok(state
            .entries
            .get(&checkpoint)
            .and_then(|entries| entries.last())
            .map(|entry| entry.value))
    }

    fn log(&self, checkpoint: Checkpoint, value: CheckpointValue, mode: WriteMode) -> Result<()> {
        check_kind(checkpoint, &value)?;

        let mut state = self.state.lock();
        let record = WalRecord {
            seq: state.next_seq,
            checkpoint,
            value,
            mode,
            recorded_at: Utc::now(),
        };
        let bytes = encode_record(&record)?;

        if state.writer.is_none() {
            state.writer = Some(self.storage.create_output_append(&self.path)?);
        }
        if let Some(writer) = state.writer.as_mut() {
            writer.write_all(&bytes)?;
            writer.flush_and_sync()?;
        }

        state.apply(&record);
        state.records_on_disk += 1;
        debug!("Checkpoint {checkpoint} = {value} ({mode:?})");

        if state.needs_compaction() {
            self.compact(&mut state)?;
        }
        Ok(())
    }

    fn history(&self, checkpoint: Checkpoint) -> Result<Vec<CheckpointValue>> {
        let state = self.state.lock();
        Ok(state
            .entries
            .get(&checkpoint)
            .map(|entries| entries.iter().map(|entry| entry.value).collect())
            .unwrap_or_default())
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.writer = None;
        state.entries.clear();
        state.records_on_disk = 0;

        let mut writer = self.storage.create_output(&self.path)?;
        writer.flush_and_sync()?;
        debug!("Cleared progress log {}", self.path);
        Ok(())
    }
}

fn read_u32(buffer: &[u8], position: usize) -> [u8; 4] {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buffer[position..position + 4]);
    bytes
}

fn encode_record(record: &WalRecord) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(record)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}
