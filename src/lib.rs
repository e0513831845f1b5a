// Declare modules
pub mod db;
pub mod error;
pub mod events;
pub mod import;
pub mod models;
pub mod resolve;

// Re-export key types for easier use
pub use error::{Result, WordCardError};
pub use events::{Listener, Notification};
pub use models::{Entry, Selection};
pub use resolve::{ResolveOptions, resolve_database_path};

use crate::db::DatabaseConnection;
use crate::events::Listeners;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Options for constructing a [`WordLookupService`].
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    /// Open this file directly instead of searching the default locations.
    pub db_path: Option<PathBuf>,
    /// Locations to search. If None, they are derived from the running
    /// executable and the user's data directory.
    pub resolve: Option<ResolveOptions>,
}

/// Random-word lookup over a dictionary file with an `entries` table.
///
/// Every failure is turned into a return sentinel, a [`Notification`] and/or
/// placeholder text in the current [`Selection`]; nothing here returns an
/// error to the caller.
#[derive(Debug)]
pub struct WordLookupService {
    selection: Selection,
    // At most one open connection per service.
    database: Option<DatabaseConnection>,
    listeners: Listeners,
}

impl Default for WordLookupService {
    fn default() -> Self {
        Self::new()
    }
}

impl WordLookupService {
    /// A service showing the placeholder card, with no database and no listeners.
    pub fn new() -> Self {
        WordLookupService {
            selection: Selection::default(),
            database: None,
            listeners: Listeners::default(),
        }
    }

    /// Creates a service and opens the dictionary found via `options`.
    ///
    /// `listener` is registered before anything is opened, so it observes
    /// the startup notifications (including "Database file not found").
    pub fn load(options: &LoadOptions, listener: Option<Listener>) -> Self {
        let mut service = Self::new();
        if let Some(listener) = listener {
            service.subscribe(listener);
        }

        let path = match &options.db_path {
            Some(path) => {
                info!("Using provided database path: {:?}", path);
                Ok(path.clone())
            }
            None => match &options.resolve {
                Some(resolve) => resolve_database_path(resolve),
                None => ResolveOptions::from_environment()
                    .and_then(|resolve| resolve_database_path(&resolve)),
            },
        };

        match path {
            Ok(path) => {
                service.open_database(&path);
            }
            Err(e) => {
                warn!("Could not locate dictionary: {}", e);
                service.emit(Notification::ErrorOccurred(e.to_string()));
            }
        }
        service
    }

    /// Registers a listener. Listeners are called in registration order.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn emit(&mut self, notification: Notification) {
        debug!("Notify: {:?}", notification);
        self.listeners.emit(notification);
    }

    /// Opens `path`, replacing any current connection, and checks for the
    /// `entries` table.
    ///
    /// A file without the table (or with an unreadable catalog) stays open
    /// but every later query against it fails.
    pub fn open_database(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.close_database();

        let connection = match DatabaseConnection::open(path) {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Cannot open database {:?}: {}", path, e);
                self.emit(Notification::ErrorOccurred(e.to_string()));
                self.emit(Notification::DatabaseOpened(false));
                return false;
            }
        };

        let probe = connection.has_entries_table();
        self.database = Some(connection);

        match probe {
            Err(e) => {
                warn!("Table check failed: {}", e);
                self.emit(Notification::DatabaseOpened(false));
                false
            }
            Ok(false) => {
                warn!("Table 'entries' not found in database {:?}", path);
                self.emit(Notification::ErrorOccurred(
                    WordCardError::SchemaMissing.to_string(),
                ));
                self.emit(Notification::DatabaseOpened(false));
                false
            }
            Ok(true) => {
                debug!("Database opened successfully from: {:?}", path);
                self.emit(Notification::DatabaseOpened(true));
                true
            }
        }
    }

    /// Closes and releases the current connection, if any. Fires nothing.
    pub fn close_database(&mut self) {
        if let Some(mut connection) = self.database.take() {
            connection.close();
        }
    }

    /// Number of entries, or 0 when there is no connection or the count fails.
    pub fn total_words(&self) -> u64 {
        let Some(database) = &self.database else {
            return 0;
        };
        database.count_entries().unwrap_or_else(|e| {
            debug!("Count query failed: {}", e);
            0
        })
    }

    /// Loads one random entry into the current selection.
    pub fn send_random_record(&mut self) {
        let fetched = self
            .database
            .as_ref()
            .map(DatabaseConnection::fetch_random_entry);

        match fetched {
            None => {
                self.set_word(models::NOT_OPENED_WORD);
                self.set_definition(models::NOT_OPENED_DEFINITION);
                self.emit(Notification::ErrorOccurred(
                    WordCardError::NotOpened.to_string(),
                ));
            }
            Some(Ok(Some(entry))) => {
                self.set_word(entry.word);
                self.set_type(entry.wordtype);
                self.set_definition(entry.definition);
            }
            Some(Ok(None)) => {
                self.set_word(models::EMPTY_WORD);
                self.set_type(models::EMPTY_TYPE);
                self.set_definition(models::EMPTY_DEFINITION);
            }
            Some(Err(e)) => {
                warn!("Query failed: {}", e);
                self.set_word(models::QUERY_ERROR_WORD);
                self.set_definition(models::QUERY_ERROR_DEFINITION);
                self.emit(Notification::ErrorOccurred(e.to_string()));
            }
        }
    }

    pub fn word(&self) -> &str {
        &self.selection.word
    }

    pub fn word_type(&self) -> &str {
        &self.selection.word_type
    }

    pub fn definition(&self) -> &str {
        &self.selection.definition
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // Setters only write and notify when the value actually changes.

    pub fn set_word(&mut self, word: impl Into<String>) {
        let word = word.into();
        if self.selection.word == word {
            return;
        }
        self.selection.word = word;
        self.emit(Notification::WordChanged);
    }

    pub fn set_type(&mut self, word_type: impl Into<String>) {
        let word_type = word_type.into();
        if self.selection.word_type == word_type {
            return;
        }
        self.selection.word_type = word_type;
        self.emit(Notification::TypeChanged);
    }

    pub fn set_definition(&mut self, definition: impl Into<String>) {
        let definition = definition.into();
        if self.selection.definition == definition {
            return;
        }
        self.selection.definition = definition;
        self.emit(Notification::DefinitionChanged);
    }

    pub fn is_open(&self) -> bool {
        self.database.as_ref().is_some_and(DatabaseConnection::is_open)
    }

    /// Name of the current connection, e.g. `flashcard_connection_3`.
    pub fn connection_name(&self) -> Option<&str> {
        self.database.as_ref().map(DatabaseConnection::name)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database.as_ref().map(DatabaseConnection::path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_entries_table, insert_entries, is_connection_live, open_connection};
    use std::sync::{Arc, Mutex};
    use tempfile::{TempDir, tempdir};

    type Recorded = Arc<Mutex<Vec<Notification>>>;

    fn recorder() -> (Listener, Recorded) {
        let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Listener = Box::new(move |n: &Notification| {
            sink.lock().unwrap().push(n.clone());
        });
        (listener, seen)
    }

    fn recording_service() -> (WordLookupService, Recorded) {
        let (listener, seen) = recorder();
        let mut service = WordLookupService::new();
        service.subscribe(listener);
        (service, seen)
    }

    fn take(seen: &Recorded) -> Vec<Notification> {
        std::mem::take(&mut *seen.lock().unwrap())
    }

    fn errors(events: &[Notification]) -> usize {
        events
            .iter()
            .filter(|n| matches!(n, Notification::ErrorOccurred(_)))
            .count()
    }

    fn dictionary(dir: &TempDir, name: &str, entries: &[Entry]) -> PathBuf {
        let path = dir.path().join(name);
        let mut conn = open_connection(&path).unwrap();
        create_entries_table(&conn).unwrap();
        insert_entries(&mut conn, entries).unwrap();
        path
    }

    fn cat_and_run() -> Vec<Entry> {
        vec![
            Entry::new("cat", "noun", "a small domesticated feline"),
            Entry::new("run", "verb", "to move swiftly on foot"),
        ]
    }

    #[test]
    fn new_service_shows_placeholder() {
        let service = WordLookupService::new();
        assert_eq!(service.word(), "Loading...");
        assert_eq!(service.word_type(), "");
        assert_eq!(service.definition(), "Click to load a word");
        assert!(!service.is_open());
        assert_eq!(service.connection_name(), None);
    }

    #[test]
    fn random_record_without_database() {
        let (mut service, seen) = recording_service();
        service.set_type("noun");
        take(&seen);

        service.send_random_record();

        assert_eq!(service.word(), "Database Error");
        assert_eq!(
            service.definition(),
            "Please ensure dictionary.db is in the application folder"
        );
        assert_eq!(service.word_type(), "noun");
        assert_eq!(
            take(&seen),
            vec![
                Notification::WordChanged,
                Notification::DefinitionChanged,
                Notification::ErrorOccurred("Database not opened".to_string()),
            ]
        );
    }

    #[test]
    fn open_valid_dictionary() {
        let dir = tempdir().unwrap();
        let path = dictionary(&dir, "dictionary.db", &cat_and_run());
        let (mut service, seen) = recording_service();

        assert!(service.open_database(&path));
        assert_eq!(take(&seen), vec![Notification::DatabaseOpened(true)]);
        assert!(service.is_open());
        assert_eq!(service.database_path(), Some(path.as_path()));
    }

    #[test]
    fn open_without_entries_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.db");
        open_connection(&path)
            .unwrap()
            .execute("CREATE TABLE words (w TEXT)", [])
            .unwrap();
        let (mut service, seen) = recording_service();

        assert!(!service.open_database(&path));
        assert_eq!(
            take(&seen),
            vec![
                Notification::ErrorOccurred("Database table 'entries' not found".to_string()),
                Notification::DatabaseOpened(false),
            ]
        );

        // The handle stays open but is unusable.
        assert!(service.is_open());
        assert_eq!(service.total_words(), 0);
        service.send_random_record();
        assert_eq!(service.word(), "Query Error");
        assert_eq!(service.definition(), "Failed to fetch word from database");
        assert_eq!(errors(&take(&seen)), 1);
    }

    #[test]
    fn probe_failure_only_reports_not_opened() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, vec![0x42u8; 4096]).unwrap();
        let (mut service, seen) = recording_service();

        assert!(!service.open_database(&path));
        assert_eq!(take(&seen), vec![Notification::DatabaseOpened(false)]);
    }

    #[test]
    fn open_failure_reports_driver_text() {
        let dir = tempdir().unwrap();
        let good = dictionary(&dir, "good.db", &cat_and_run());
        let bad = dir.path().join("missing-dir").join("dictionary.db");
        let (mut service, seen) = recording_service();
        assert!(service.open_database(&good));
        let previous = service.connection_name().unwrap().to_string();
        take(&seen);

        assert!(!service.open_database(&bad));

        let events = take(&seen);
        assert_eq!(events.len(), 2);
        match &events[0] {
            Notification::ErrorOccurred(text) => assert!(!text.is_empty()),
            other => panic!("expected an error first, got {other:?}"),
        }
        assert_eq!(events[1], Notification::DatabaseOpened(false));
        assert!(!service.is_open());
        assert!(!is_connection_live(&previous));
    }

    #[test]
    fn reopening_releases_previous_connection() {
        let dir = tempdir().unwrap();
        let a = dictionary(&dir, "a.db", &cat_and_run());
        let b = dictionary(&dir, "b.db", &cat_and_run()[..1]);
        let mut service = WordLookupService::new();

        assert!(service.open_database(&a));
        let name_a = service.connection_name().unwrap().to_string();
        assert!(is_connection_live(&name_a));

        assert!(service.open_database(&b));
        let name_b = service.connection_name().unwrap().to_string();

        assert_ne!(name_a, name_b);
        assert!(!is_connection_live(&name_a));
        assert!(is_connection_live(&name_b));
        assert_eq!(service.total_words(), 1);

        service.close_database();
        assert!(!is_connection_live(&name_b));
        assert!(!service.is_open());
    }

    #[test]
    fn total_words_counts_rows_silently() {
        let dir = tempdir().unwrap();
        let entries: Vec<Entry> = (0..25)
            .map(|i| Entry::new(format!("word{i}"), "noun", format!("definition {i}")))
            .collect();
        let path = dictionary(&dir, "many.db", &entries);
        let (mut service, seen) = recording_service();

        assert_eq!(service.total_words(), 0);
        assert!(take(&seen).is_empty());

        service.open_database(&path);
        take(&seen);
        assert_eq!(service.total_words(), 25);

        service.close_database();
        assert_eq!(service.total_words(), 0);
        assert!(take(&seen).is_empty());
    }

    #[test]
    fn setters_notify_only_on_change() {
        let (mut service, seen) = recording_service();

        service.set_word("Apple");
        service.set_word("Apple");
        assert_eq!(take(&seen), vec![Notification::WordChanged]);

        service.set_type("");
        service.set_definition("Click to load a word");
        assert!(take(&seen).is_empty());

        service.set_type("noun");
        service.set_definition("a fruit");
        assert_eq!(
            take(&seen),
            vec![Notification::TypeChanged, Notification::DefinitionChanged]
        );
    }

    #[test]
    fn single_row_is_returned_every_time() {
        let dir = tempdir().unwrap();
        let path = dictionary(&dir, "one.db", &[Entry::new("cat", "noun", "a feline")]);
        let (mut service, seen) = recording_service();
        service.open_database(&path);

        service.send_random_record();
        assert_eq!(
            take(&seen),
            vec![
                Notification::DatabaseOpened(true),
                Notification::WordChanged,
                Notification::TypeChanged,
                Notification::DefinitionChanged,
            ]
        );

        for _ in 0..10 {
            service.send_random_record();
            assert_eq!(service.word(), "cat");
            assert_eq!(service.word_type(), "noun");
            assert_eq!(service.definition(), "a feline");
        }
        // Same values again: nothing changed, nothing fired.
        assert!(take(&seen).is_empty());
    }

    #[test]
    fn numeric_cells_are_shown_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("untyped.db");
        let conn = open_connection(&path).unwrap();
        conn.execute("CREATE TABLE entries (word, wordtype, definition)", [])
            .unwrap();
        conn.execute("INSERT INTO entries VALUES (42, 'num', 'the answer')", [])
            .unwrap();
        drop(conn);
        let (mut service, seen) = recording_service();
        assert!(service.open_database(&path));
        take(&seen);

        service.send_random_record();

        assert_eq!(service.word(), "42");
        assert_eq!(service.word_type(), "num");
        assert_eq!(service.definition(), "the answer");
        assert_eq!(errors(&take(&seen)), 0);
    }

    #[test]
    fn empty_table_shows_no_data() {
        let dir = tempdir().unwrap();
        let path = dictionary(&dir, "empty.db", &[]);
        let (mut service, seen) = recording_service();
        service.open_database(&path);
        service.set_type("noun");
        take(&seen);

        service.send_random_record();

        assert_eq!(service.word(), "No Data");
        assert_eq!(service.word_type(), "");
        assert_eq!(service.definition(), "The dictionary is empty");
        assert_eq!(errors(&take(&seen)), 0);
    }

    #[test]
    fn random_records_keep_rows_intact() {
        let dir = tempdir().unwrap();
        let entries = cat_and_run();
        let path = dictionary(&dir, "dictionary.db", &entries);
        let mut service = WordLookupService::new();
        assert!(service.open_database(&path));

        for _ in 0..1000 {
            service.send_random_record();
            let shown = Entry::new(service.word(), service.word_type(), service.definition());
            assert!(entries.contains(&shown), "unexpected card {shown:?}");
        }
    }

    #[test]
    fn load_reports_missing_dictionary() {
        let dir = tempdir().unwrap();
        let options = LoadOptions {
            db_path: None,
            resolve: Some(ResolveOptions {
                app_dir: dir.path().join("app"),
                bundled_resource: None,
                data_dir: dir.path().join("data"),
            }),
        };
        let (listener, seen) = recorder();

        let service = WordLookupService::load(&options, Some(listener));

        assert_eq!(
            take(&seen),
            vec![Notification::ErrorOccurred("Database file not found".to_string())]
        );
        assert!(!service.is_open());
        assert_eq!(service.selection(), &Selection::default());
    }

    #[test]
    fn load_copies_bundled_dictionary() {
        let dir = tempdir().unwrap();
        let bundled = dictionary(&dir, "bundled.db", &cat_and_run());
        let data_dir = dir.path().join("data");
        let options = LoadOptions {
            db_path: None,
            resolve: Some(ResolveOptions {
                app_dir: dir.path().join("app"),
                bundled_resource: Some(bundled),
                data_dir: data_dir.clone(),
            }),
        };
        let (listener, seen) = recorder();

        let service = WordLookupService::load(&options, Some(listener));

        assert_eq!(take(&seen), vec![Notification::DatabaseOpened(true)]);
        assert_eq!(
            service.database_path(),
            Some(data_dir.join("dictionary.db").as_path())
        );
        assert_eq!(service.total_words(), 2);
    }

    #[test]
    fn load_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dictionary(&dir, "explicit.db", &cat_and_run());
        let options = LoadOptions {
            db_path: Some(path.clone()),
            resolve: None,
        };

        let service = WordLookupService::load(&options, None);

        assert!(service.is_open());
        assert_eq!(service.database_path(), Some(path.as_path()));
    }
}
