//! ==============================================================================
//! store.rs - event store (newest-first event log)
//! ==============================================================================
//!
//! purpose:
//!     holds every sensor ping received from the bin, most recent first.
//!     two implementations share one contract:
//!     - MemoryStore: lives in process memory, cleared on restart
//!     - FileStore: mirrors the log to a json array on disk and reloads it
//!       at startup
//!
//! invariants:
//!     - index 0 is always the most recent event; order is never re-sorted
//!     - events are never removed; readers only ever see the first N
//!     - with dedup on, an event whose count equals the current head's count
//!       is dropped (adjacent duplicates only)
//!
//! persistence:
//!     the whole log is serialized to a temp file next to the target and
//!     renamed into place while the write lock is held, so the file always
//!     holds a complete array and there is a single writer per process.
//!
//! relationships:
//!     - used by: server.rs (ingest and history handlers), main.rs (startup)
//!     - uses: domain.rs (Event), error.rs (StoreError)
//!
//! ==============================================================================

use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::domain::Event;
use crate::error::StoreError;

/// number of events the history api exposes
pub const HISTORY_LIMIT: usize = 20;

/// behaviour toggles shared by every store implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// drop an event whose count equals the most recent one
    pub dedup: bool,
    /// keep the `nivel` field (fill percentage)
    pub track_level: bool,
}

impl StoreOptions {
    /// builds the event to insert, or None if dedup suppresses it
    fn admit(&self, head: Option<&Event>, count: String, level: Option<String>) -> Option<Event> {
        if self.dedup && head.is_some_and(|h| h.count == count) {
            return None;
        }
        let level = self.track_level.then(|| level.unwrap_or_default());
        Some(Event::now(count, level))
    }
}

/// outcome of [`EventStore::record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Stored(Event),
    /// same count as the previous event, nothing written
    Duplicate,
}

/// the event log contract used by the http handlers
///
/// implementations must be shareable across request tasks; handlers hold an
/// `Arc<dyn EventStore>`.
pub trait EventStore: Send + Sync {
    /// stamp and prepend a new event
    fn record(&self, count: String, level: Option<String>) -> Result<Recorded, StoreError>;

    /// the first `limit` events, newest first
    fn recent(&self, limit: usize) -> Vec<Event>;

    /// total number of stored events
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn first(events: &VecDeque<Event>, limit: usize) -> Vec<Event> {
    events.iter().take(limit).cloned().collect()
}

// ==============================================================================
// in-memory store
// ==============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<VecDeque<Event>>,
    options: StoreOptions,
}

impl MemoryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            options,
        }
    }
}

impl EventStore for MemoryStore {
    fn record(&self, count: String, level: Option<String>) -> Result<Recorded, StoreError> {
        let mut events = self.events.write();
        match self.options.admit(events.front(), count, level) {
            Some(event) => {
                events.push_front(event.clone());
                Ok(Recorded::Stored(event))
            }
            None => Ok(Recorded::Duplicate),
        }
    }

    fn recent(&self, limit: usize) -> Vec<Event> {
        first(&self.events.read(), limit)
    }

    fn len(&self) -> usize {
        self.events.read().len()
    }
}

// ==============================================================================
// file-backed store
// ==============================================================================

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    events: RwLock<VecDeque<Event>>,
    options: StoreOptions,
}

impl FileStore {
    /// open the history file, loading whatever it already holds
    ///
    /// a missing file starts an empty log (its directory is created); a file
    /// that is not a json array of events is an error.
    pub fn open(path: impl Into<PathBuf>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        }
        let events = load(&path)?;
        Ok(Self {
            path,
            events: RwLock::new(events.into()),
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for FileStore {
    fn record(&self, count: String, level: Option<String>) -> Result<Recorded, StoreError> {
        let mut events = self.events.write();
        let Some(event) = self.options.admit(events.front(), count, level) else {
            return Ok(Recorded::Duplicate);
        };

        events.push_front(event.clone());
        if let Err(e) = write_atomic(&self.path, &events) {
            // keep memory and disk in agreement
            events.pop_front();
            return Err(e);
        }
        Ok(Recorded::Stored(event))
    }

    fn recent(&self, limit: usize) -> Vec<Event> {
        first(&self.events.read(), limit)
    }

    fn len(&self) -> usize {
        self.events.read().len()
    }
}

/// read a persisted history, newest first
pub fn load(path: &Path) -> Result<Vec<Event>, StoreError> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&content).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// serialize the log to a temp file beside `path` and rename it into place
fn write_atomic(path: &Path, events: &VecDeque<Event>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let json = serde_json::to_vec(events)?;
    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp_file.write_all(&json).map_err(io_err)?;
    temp_file.as_file().sync_all().map_err(io_err)?;
    temp_file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

// ==============================================================================
// tests
// ==============================================================================
