use serde::{Deserialize, Serialize};

// --- Persisted ---

/// One row of the `entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub word: String,
    /// Part of speech or category label. May be empty.
    #[serde(default)]
    pub wordtype: String,
    pub definition: String,
}

impl Entry {
    pub fn new(
        word: impl Into<String>,
        wordtype: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Entry {
            word: word.into(),
            wordtype: wordtype.into(),
            definition: definition.into(),
        }
    }
}

// --- In-memory ---

pub const PLACEHOLDER_WORD: &str = "Loading...";
pub const PLACEHOLDER_TYPE: &str = "";
pub const PLACEHOLDER_DEFINITION: &str = "Click to load a word";

pub const NOT_OPENED_WORD: &str = "Database Error";
pub const NOT_OPENED_DEFINITION: &str = "Please ensure dictionary.db is in the application folder";

pub const QUERY_ERROR_WORD: &str = "Query Error";
pub const QUERY_ERROR_DEFINITION: &str = "Failed to fetch word from database";

pub const EMPTY_WORD: &str = "No Data";
pub const EMPTY_TYPE: &str = "";
pub const EMPTY_DEFINITION: &str = "The dictionary is empty";

/// The three display fields of the most recently shown card.
///
/// Always holds something printable: real data, one of the error phrases
/// above, or the initial placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub word: String,
    #[serde(rename = "type")]
    pub word_type: String,
    pub definition: String,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            word: PLACEHOLDER_WORD.to_string(),
            word_type: PLACEHOLDER_TYPE.to_string(),
            definition: PLACEHOLDER_DEFINITION.to_string(),
        }
    }
}
