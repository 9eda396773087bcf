//! Device-local persistence of column visibility toggles.
//!
//! The one durable piece of state outside the URL. The record lives behind a
//! simple key-value port; anything missing or corrupt loads as "all columns
//! visible" so a bad record can never break the table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{error::Error, export::Column};

/// Device-local key-value storage, conceptually the browser's localStorage.
pub trait PrefStore {
    /// Read the raw record stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous record.
    fn set(&mut self, key: &str, value: String);
}

/// The stored wire format: just the hidden column keys.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredVisibility {
    hidden: Vec<String>,
}

/// Which columns of a table are hidden.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnVisibility {
    hidden: BTreeSet<String>,
}

impl ColumnVisibility {
    /// Load the visibility record stored under `pref_key`.
    ///
    /// A missing or corrupt record falls back to all-visible.
    pub fn load(store: &impl PrefStore, pref_key: &str) -> Self {
        let Some(raw) = store.get(pref_key) else {
            return Self::default();
        };

        match serde_json::from_str::<StoredVisibility>(&raw) {
            Ok(stored) => Self {
                hidden: stored.hidden.into_iter().collect(),
            },
            Err(error) => {
                tracing::warn!("corrupt column visibility record under {pref_key:?}: {error}");
                Self::default()
            }
        }
    }

    /// Persist this record under `pref_key`.
    pub fn save(&self, store: &mut impl PrefStore, pref_key: &str) {
        let stored = StoredVisibility {
            hidden: self.hidden.iter().cloned().collect(),
        };
        let raw = serde_json::to_string(&stored).expect("invalid visibility record");

        store.set(pref_key, raw);
    }

    /// Whether the column with `key` is visible.
    pub fn is_visible(&self, key: &str) -> bool {
        !self.hidden.contains(key)
    }

    /// Hide a column.
    ///
    /// # Errors
    /// Returns [Error::LastColumnRequired] when `key` is the last visible
    /// column of `catalog`; the record is left unchanged.
    pub fn hide(&mut self, key: &str, catalog: &[Column]) -> Result<(), Error> {
        let visible: Vec<_> = catalog
            .iter()
            .filter(|column| self.is_visible(column.key))
            .collect();

        if visible.len() == 1 && visible[0].key == key {
            return Err(Error::LastColumnRequired);
        }

        self.hidden.insert(key.to_owned());
        Ok(())
    }

    /// Show a previously hidden column.
    pub fn show(&mut self, key: &str) {
        self.hidden.remove(key);
    }

    /// The visible columns of `catalog`, in catalog order.
    pub fn visible_columns<'a>(&self, catalog: &'a [Column]) -> Vec<&'a Column> {
        catalog
            .iter()
            .filter(|column| self.is_visible(column.key))
            .collect()
    }
}
