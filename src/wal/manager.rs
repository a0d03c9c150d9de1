//! Owns the set of numbered WAL segments in a directory and tracks which
//! one is current.
//!
//! Grounded on the reference implementation's `wal_manager.go`
//! (`newWalManager`/`openWals`/`roll`/`shouldRoll`), restructured around
//! an explicit `BTreeMap<u64, WalSegment>` so `current()` is a lookup
//! rather than a panic-on-missing invariant check.

use crate::error::Result;
use crate::wal::segment::WalSegment;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEGMENT_EXTENSION: &str = "wal";

pub struct WalManager {
    root: PathBuf,
    segments: BTreeMap<u64, WalSegment>,
    current_id: u64,
}

impl WalManager {
    /// Ensures `root` exists, opens every `*.wal` segment found in it (a
    /// non-numeric basename is skipped with a warning), and creates
    /// segment `0` if the directory was empty. The highest id found
    /// becomes the current segment.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let mut segments = BTreeMap::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }

            let path = entry.path();
            let Some(id) = parse_segment_id(&path) else {
                tracing::warn!(path = %path.display(), "skipping wal file with non-numeric name");
                continue;
            };

            let segment = WalSegment::open(id, &path)?;
            segments.insert(id, segment);
        }

        let current_id = match segments.keys().next_back() {
            Some(&max_id) => max_id,
            None => {
                let path = root.join(format!("0.{SEGMENT_EXTENSION}"));
                segments.insert(0, WalSegment::open(0, path)?);
                0
            }
        };

        Ok(Self {
            root,
            segments,
            current_id,
        })
    }

    /// The segment every writer targets. Always present by construction.
    pub fn current(&self) -> &WalSegment {
        self.segments
            .get(&self.current_id)
            .expect("current segment id always has a backing segment")
    }

    pub fn current_id(&self) -> u64 {
        self.current_id
    }

    /// Every segment in ascending id order (for recovery scans).
    pub fn segments_in_order(&self) -> impl Iterator<Item = &WalSegment> {
        self.segments.values()
    }

    pub fn should_roll(&self, threshold_bytes: u64) -> Result<bool> {
        Ok(self.current().size_bytes()? > threshold_bytes)
    }

    /// Seals the current segment and opens `current + 1` as the new
    /// current segment. The prior segment stays open: it still
    /// participates in recovery on the next process start but is never
    /// targeted by a writer again.
    pub fn roll(&mut self) -> Result<()> {
        let next_id = self.current_id + 1;
        let path = self.root.join(format!("{next_id}.{SEGMENT_EXTENSION}"));
        let segment = WalSegment::open(next_id, path)?;
        self.segments.insert(next_id, segment);
        self.current_id = next_id;
        tracing::info!(segment_id = next_id, "rolled wal to new segment");
        Ok(())
    }

    /// Closes every segment, aggregating the first error encountered.
    pub fn close(&self) -> Result<()> {
        let mut first_err = None;
        for segment in self.segments.values() {
            if let Err(e) = segment.close() {
                tracing::error!(segment_id = segment.id, error = %e, "failed to close wal segment");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn parse_segment_id(path: &Path) -> Option<u64> {
    if path.extension().and_then(|e| e.to_str()) != Some(SEGMENT_EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
