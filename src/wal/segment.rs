//! A single append-only WAL file: `<id>.wal` holding a stream of framed
//! [`Operation`](crate::codec::Operation) records.
//!
//! Grounded on the teacher crate's `transaction::wal::WALManager` (shared
//! buffered reader/writer over one file handle) and the reference
//! implementation's `wal.go` (`openWal`/`read`/`write`/`flush`/`close`).

use crate::codec::{self, Operation};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One numbered segment file, e.g. `wal/3.wal`.
pub struct WalSegment {
    pub id: u64,
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl WalSegment {
    /// Opens (creating if absent) the segment file for append + read/write.
    pub fn open(id: u64, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        tracing::debug!(segment_id = id, path = %path.display(), "opened wal segment");

        Ok(Self {
            id,
            path,
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Serializes and appends every operation, flushing before returning.
    pub fn append(&self, ops: &[Operation]) -> Result<()> {
        let mut writer = self.file.lock();
        for op in ops {
            writer.write_all(&op.serialize())?;
        }
        writer.flush()?;
        tracing::trace!(segment_id = self.id, count = ops.len(), "appended wal operations");
        Ok(())
    }

    /// Flushes buffered writes to the OS without forcing a sync.
    pub fn flush(&self) -> Result<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    /// Reads every framed record from the start of the file, repositioning
    /// at the end afterwards so subsequent appends continue correctly.
    /// A record with no trailing RS (a torn write) is silently dropped;
    /// any other malformed record aborts the scan.
    pub fn scan(&self) -> Result<Vec<Operation>> {
        let mut writer = self.file.lock();
        writer.flush()?;

        let file = writer.get_mut();
        file.seek(SeekFrom::Start(0))?;

        let mut buf = Vec::new();
        BufReader::new(&mut *file).read_to_end(&mut buf)?;

        let mut ops = Vec::new();
        let mut rest = &buf[..];
        while let Some((consumed, record)) = codec::next_record(rest) {
            let op = codec::deserialize(record).map_err(|e| {
                Error::Corruption(format!(
                    "segment {} contains a malformed record: {e}",
                    self.id
                ))
            })?;
            ops.push(op);
            rest = &rest[consumed..];
        }

        file.seek(SeekFrom::End(0))?;
        Ok(ops)
    }

    pub fn size_bytes(&self) -> Result<u64> {
        Ok(self.file.lock().get_ref().metadata()?.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn close(&self) -> Result<()> {
        self.flush()
    }
}
