use crate::error::{Result, WordCardError};
use crate::models::Entry;
use log::{debug, info, warn};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

// --- SQL ---

const PROBE_ENTRIES_TABLE: &str =
    "SELECT name FROM sqlite_master WHERE type='table' AND name='entries'";

const COUNT_ENTRIES: &str = "SELECT COUNT(*) FROM entries";

const SELECT_RANDOM_ENTRY: &str =
    "SELECT word, wordtype, definition FROM entries ORDER BY RANDOM() LIMIT 1";

const CREATE_ENTRIES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS entries (
    word TEXT,
    wordtype TEXT,
    definition TEXT
);";

const INSERT_ENTRY: &str = "INSERT INTO entries (word, wordtype, definition) VALUES (?1, ?2, ?3)";

// --- Connection naming ---

const CONNECTION_PREFIX: &str = "flashcard_connection_";

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Names of every `DatabaseConnection` currently alive in this process.
static LIVE_CONNECTIONS: Mutex<BTreeSet<String>> = Mutex::new(BTreeSet::new());

fn next_connection_name() -> String {
    let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}{}", CONNECTION_PREFIX, id)
}

fn with_registry<T>(f: impl FnOnce(&mut BTreeSet<String>) -> T) -> T {
    // A panicking holder cannot leave the set half-updated.
    let mut guard = LIVE_CONNECTIONS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

/// Returns true while a connection with this name is open somewhere in the process.
pub fn is_connection_live(name: &str) -> bool {
    with_registry(|live| live.contains(name))
}

// --- Raw connection helpers ---

/// Opens (or creates) an SQLite file for read/write access.
///
/// Like the stock driver, this creates an empty file when `path` does not
/// exist; callers find out through the schema probe.
pub fn open_connection(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )
    .map_err(WordCardError::Open)
}

/// Checks the table catalog for a table literally named `entries`.
///
/// `Ok(false)` means the catalog was readable but has no such table;
/// `Err(SchemaProbe)` means the catalog query itself failed.
pub fn has_entries_table(conn: &Connection) -> Result<bool> {
    let mut stmt = conn
        .prepare(PROBE_ENTRIES_TABLE)
        .map_err(WordCardError::SchemaProbe)?;
    let found: Option<String> = stmt
        .query_row([], |row| row.get(0))
        .optional()
        .map_err(WordCardError::SchemaProbe)?;
    Ok(found.is_some())
}

/// Counts rows in `entries`.
pub fn count_entries(conn: &Connection) -> Result<u64> {
    let count: Option<i64> = conn
        .query_row(COUNT_ENTRIES, [], |row| row.get(0))
        .optional()?;
    Ok(count.and_then(|n| u64::try_from(n).ok()).unwrap_or(0))
}

/// Samples one entry uniformly at random, re-evaluated on every call.
///
/// Returns `Ok(None)` for an empty table. Every cell is shown as text, see
/// [`cell_to_string`].
pub fn fetch_random_entry(conn: &Connection) -> Result<Option<Entry>> {
    let mut stmt = conn.prepare(SELECT_RANDOM_ENTRY)?;
    let entry = stmt
        .query_row([], |row| {
            Ok(Entry {
                word: cell_to_string(row.get_ref("word")?),
                wordtype: cell_to_string(row.get_ref("wordtype")?),
                definition: cell_to_string(row.get_ref("definition")?),
            })
        })
        .optional()?;
    Ok(entry)
}

/// Renders any SQLite value as display text: NULL is empty, numbers use
/// their decimal form, text and blobs are decoded as (lossy) UTF-8.
pub(crate) fn cell_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Creates the `entries` table if it does not exist yet.
pub fn create_entries_table(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_ENTRIES_TABLE, [])?;
    Ok(())
}

/// Bulk-inserts entries inside a single transaction with a prepared statement.
/// Returns the number of rows written.
pub fn insert_entries(conn: &mut Connection, entries: &[Entry]) -> Result<usize> {
    info!("Inserting {} entries...", entries.len());
    let start_time = Instant::now();

    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(INSERT_ENTRY)?;
        for entry in entries {
            inserted += stmt.execute(params![entry.word, entry.wordtype, entry.definition])?;
        }
    }
    tx.commit()?;

    info!(
        "Inserted {} entries. Took {:.2?}",
        inserted,
        start_time.elapsed()
    );
    Ok(inserted)
}

// --- DatabaseConnection ---

/// An open dictionary file plus its process-unique connection name.
///
/// The name is registered as live from `open` until `close` or drop.
#[derive(Debug)]
pub struct DatabaseConnection {
    conn: Option<Connection>,
    name: String,
    path: PathBuf,
}

impl DatabaseConnection {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path)?;
        let name = next_connection_name();
        with_registry(|live| live.insert(name.clone()));
        debug!("Opened connection {} to {:?}", name, path);
        Ok(DatabaseConnection {
            conn: Some(conn),
            name,
            path: path.to_path_buf(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(WordCardError::NotOpened)
    }

    pub fn has_entries_table(&self) -> Result<bool> {
        has_entries_table(self.conn()?)
    }

    pub fn count_entries(&self) -> Result<u64> {
        count_entries(self.conn()?)
    }

    pub fn fetch_random_entry(&self) -> Result<Option<Entry>> {
        fetch_random_entry(self.conn()?)
    }

    /// Closes the handle and releases its name. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!("Error while closing connection {}: {}", self.name, e);
            }
            debug!("Closed connection {}", self.name);
        }
        with_registry(|live| live.remove(&self.name));
    }
}

impl Drop for DatabaseConnection {
    fn drop(&mut self) {
        self.close();
    }
}
