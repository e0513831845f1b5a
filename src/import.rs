use crate::error::{Result, WordCardError};
use crate::models::Entry;
use log::debug;

/// Parses tab-separated `word<TAB>wordtype<TAB>definition` lines.
///
/// Blank lines and lines starting with `#` are skipped. The definition is
/// everything after the second tab, so it may itself contain tabs.
pub fn parse_entries_tsv(content: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(word), Some(wordtype), Some(definition)) if !word.is_empty() => {
                entries.push(Entry::new(word, wordtype, definition));
            }
            _ => {
                return Err(WordCardError::ParseError(format!(
                    "line {}: expected word<TAB>wordtype<TAB>definition",
                    index + 1
                )));
            }
        }
    }
    debug!("Parsed {} entries from TSV input.", entries.len());
    Ok(entries)
}
