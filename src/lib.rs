//! Filter state and query resolution for a lead-management dashboard.
//!
//! This library owns the logic that every filterable page repeats: mapping
//! filter controls (status, owner, source, search, date period) to a
//! canonical URL query string, resolving semantic period tokens like
//! `lastMonth` into concrete UTC instants, staging edits behind a manual
//! "Apply" on constrained layouts, and serializing list and export requests.
//!
//! It deliberately does no I/O of its own: the current query string, the
//! replace-navigation primitive, the clock, and device-local preference
//! storage are all injected ports, so everything here is deterministic under
//! test.

#![warn(missing_docs)]

mod column_prefs;
mod error;
mod export;
mod filter;
mod period;
mod staged;
#[cfg(test)]
mod test_utils;
mod url_store;

pub use column_prefs::{ColumnVisibility, PrefStore};
pub use error::Error;
pub use export::{
    Column, ExportFieldSelection, LEAD_COLUMNS, build_export_query, build_list_query,
};
pub use filter::{FilterKey, FilterSchema, FilterState, decode, encode};
pub use period::{ALL_TOKENS, PeriodToken, ResolvedRange, normalize_token, resolve};
pub use staged::{StagePhase, StagedFilterController};
pub use url_store::{NavigateOptions, Navigator, QuerySource, UrlFilterStore};
