//! Instrument universe: the symbols an opportunity scan walks over.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseEntry {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
}

impl UniverseEntry {
    /// Entry known only by its ticker.
    pub fn bare(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector: None,
        }
    }

    pub fn in_sector(&self, sector: &str) -> bool {
        self.sector
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(sector.trim()))
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma-separated ticker list, uppercasing and rejecting duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<UniverseEntry>, UniverseError> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        entries.push(UniverseEntry::bare(&symbol));
    }

    Ok(entries)
}

/// Keep entries from `sector` (case-insensitive); `None` keeps everything.
pub fn filter_sector(entries: Vec<UniverseEntry>, sector: Option<&str>) -> Vec<UniverseEntry> {
    match sector {
        Some(sector) => entries.into_iter().filter(|e| e.in_sector(sector)).collect(),
        None => entries,
    }
}

/// Drop later entries whose symbol was already seen, keeping first-seen order.
pub fn dedup_symbols(entries: Vec<UniverseEntry>) -> Vec<UniverseEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.symbol.clone()))
        .collect()
}
