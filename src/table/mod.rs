//! In-memory tables for the two sources.
//!
//! A [`SourceTable`] keeps the header order of the file it came from so the
//! primary table can be written back column-for-column.

pub mod csv_load;

use crate::error::ReconcileError;
use crate::models::{FighterRecord, MasterRecord};
use crate::normalize::normalize_name;

/// Rows that can be compared by name.
pub trait NamedRow {
    fn display_name(&self) -> &str;

    fn normalized_key(&self) -> String {
        normalize_name(self.display_name())
    }
}

impl NamedRow for FighterRecord {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl NamedRow for MasterRecord {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn normalized_key(&self) -> String {
        self.normalized_key.clone()
    }
}

/// A borrowed row together with its position in the table and its key.
#[derive(Debug, Clone)]
pub struct KeyedRow<'a, R> {
    pub index: usize,
    pub row: &'a R,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct SourceTable<R> {
    name: String,
    headers: Vec<String>,
    rows: Vec<R>,
}

impl<R> SourceTable<R> {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<R>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut R> {
        self.rows.get_mut(index)
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

impl<R: NamedRow> SourceTable<R> {
    pub fn with_normalized_keys(&self) -> Vec<KeyedRow<'_, R>> {
        self.subset(|_| true)
    }

    /// Rows satisfying `predicate`, keyed, with their original indices.
    pub fn subset<F>(&self, predicate: F) -> Vec<KeyedRow<'_, R>>
    where
        F: Fn(&R) -> bool,
    {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| predicate(r))
            .map(|(index, row)| KeyedRow {
                index,
                row,
                key: row.normalized_key(),
            })
            .collect()
    }
}

impl SourceTable<FighterRecord> {
    pub fn unmatched(&self) -> Vec<KeyedRow<'_, FighterRecord>> {
        self.subset(|r| !r.is_matched())
    }
}

/// Position of `column` in `headers`, ignoring case and surrounding spaces.
pub fn find_column(headers: &[String], column: &str) -> Option<usize> {
    let want = column.trim();
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(want))
}

pub fn require_column(headers: &[String], table: &str, column: &str) -> Result<usize, ReconcileError> {
    find_column(headers, column).ok_or_else(|| ReconcileError::MalformedInput {
        table: table.to_string(),
        column: column.to_string(),
    })
}
