//! Builds the query strings sent to list and export endpoints.
//!
//! Filter fields serialize through the same codec as the URL so that "what
//! you see" and "what you export" always agree; resolved date bounds ride
//! along as `dateFrom`/`dateTo`.

use std::collections::BTreeSet;

use crate::{
    error::Error,
    filter::{FilterSchema, FilterState, encode_pairs, pairs_to_query},
    period::ResolvedRange,
};

/// One column in an export catalog: the internal key plus the header label
/// the backend's export endpoint is driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Stable internal identifier.
    pub key: &'static str,
    /// Human-readable header label, as it appears in exported files.
    pub header: &'static str,
}

/// The canonical lead-table columns, in display order.
pub const LEAD_COLUMNS: &[Column] = &[
    Column { key: "name", header: "Name" },
    Column { key: "email", header: "Email" },
    Column { key: "phone", header: "Phone" },
    Column { key: "status", header: "Status" },
    Column { key: "source", header: "Source" },
    Column { key: "owner", header: "Owner" },
    Column { key: "value", header: "Deal Value" },
    Column { key: "createdAt", header: "Created" },
];

/// The set of columns picked for an export.
///
/// At least one column must stay selected; deselecting the last one is a
/// rejected no-op rather than an error state or a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFieldSelection {
    selected: BTreeSet<&'static str>,
}

impl ExportFieldSelection {
    /// A selection covering every column of `catalog`.
    pub fn all(catalog: &[Column]) -> Self {
        Self {
            selected: catalog.iter().map(|column| column.key).collect(),
        }
    }

    /// A selection of the given column keys.
    pub fn from_keys(keys: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            selected: keys.into_iter().collect(),
        }
    }

    /// Whether `key` is currently selected.
    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    /// Add a column to the selection.
    pub fn select(&mut self, key: &'static str) {
        self.selected.insert(key);
    }

    /// Remove a column from the selection.
    ///
    /// # Errors
    /// Returns [Error::LastColumnRequired] when `key` is the only selected
    /// column; the selection is left unchanged.
    pub fn deselect(&mut self, key: &str) -> Result<(), Error> {
        if self.selected.len() == 1 && self.selected.contains(key) {
            return Err(Error::LastColumnRequired);
        }

        self.selected.remove(key);
        Ok(())
    }

    /// Whether the selection covers every column of `catalog`.
    pub fn is_full(&self, catalog: &[Column]) -> bool {
        catalog.iter().all(|column| self.selected.contains(column.key))
    }

    /// The selected header labels, in catalog order.
    fn headers(&self, catalog: &[Column]) -> Vec<&'static str> {
        catalog
            .iter()
            .filter(|column| self.selected.contains(column.key))
            .map(|column| column.header)
            .collect()
    }
}

/// Build the query string for a list request: codec-encoded filters plus
/// resolved date bounds.
pub fn build_list_query(
    state: &FilterState,
    schema: &FilterSchema,
    range: &ResolvedRange,
) -> String {
    pairs_to_query(&filter_pairs(state, schema, range))
}

/// Build the query string for an export request.
///
/// `fields` is a comma-joined list of column *header labels* in catalog
/// order, included only when `selection` is a strict, non-empty subset of
/// `catalog`. It is omitted entirely when every column is selected (size
/// optimization and backward compatibility) and when the caller passes no
/// selection at all ("didn't ask" is distinct from "asked for everything").
pub fn build_export_query(
    state: &FilterState,
    schema: &FilterSchema,
    range: &ResolvedRange,
    selection: Option<&ExportFieldSelection>,
    catalog: &[Column],
) -> String {
    let mut pairs = filter_pairs(state, schema, range);

    if let Some(selection) = selection {
        let headers = selection.headers(catalog);
        if !headers.is_empty() && !selection.is_full(catalog) {
            pairs.push(("fields".to_owned(), headers.join(",")));
        }
    }

    pairs_to_query(&pairs)
}

fn filter_pairs(
    state: &FilterState,
    schema: &FilterSchema,
    range: &ResolvedRange,
) -> Vec<(String, String)> {
    let mut pairs = encode_pairs(state, schema);

    if let Some(date_from) = &range.date_from {
        pairs.push(("dateFrom".to_owned(), date_from.clone()));
    }

    if let Some(date_to) = &range.date_to {
        pairs.push(("dateTo".to_owned(), date_to.clone()));
    }

    pairs
}
