//! The manual-apply staging contract for constrained layouts.
//!
//! On mobile the filter sheet stages edits in a draft and commits them
//! atomically on "Apply"; on desktop each control commits immediately. Both
//! are explicit operations on this controller, the breakpoint only decides
//! which surface calls which.

use std::collections::BTreeSet;

use crate::{
    error::Error,
    filter::{FilterKey, FilterState},
    period::PeriodToken,
    url_store::{Navigator, QuerySource, UrlFilterStore},
};

/// Whether the staging surface is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    /// Surface closed; draft tracks committed state.
    Idle,
    /// Surface open; the draft may diverge from committed state.
    Staging,
}

/// Holds a draft copy of filter state and commits it atomically.
///
/// Within one staging session `open` precedes any edit, which precedes
/// `apply` or `cancel`. Closing the surface without applying is equivalent
/// to [StagedFilterController::cancel] and must leave no partial URL
/// mutation.
pub struct StagedFilterController<Q, N> {
    store: UrlFilterStore<Q, N>,
    committed: FilterState,
    draft: FilterState,
    edited: BTreeSet<FilterKey>,
    phase: StagePhase,
}

impl<Q: QuerySource, N: Navigator> StagedFilterController<Q, N> {
    /// Create a controller over `store`, reading the initial committed state
    /// from the current URL.
    pub fn new(store: UrlFilterStore<Q, N>) -> Self {
        let committed = store.read();

        Self {
            draft: committed.clone(),
            committed,
            edited: BTreeSet::new(),
            phase: StagePhase::Idle,
            store,
        }
    }

    /// The current phase of the staging surface.
    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    /// The last committed filter state.
    pub fn committed(&self) -> &FilterState {
        &self.committed
    }

    /// The draft the staging surface renders.
    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    /// Open the staging surface; the draft restarts as a copy of committed
    /// state.
    pub fn open(&mut self) {
        self.committed = self.store.read();
        self.draft = self.committed.clone();
        self.edited.clear();
        self.phase = StagePhase::Staging;
    }

    /// Stage a period selection, with custom bounds when `token` is
    /// [PeriodToken::Custom].
    pub fn stage_period(&mut self, token: PeriodToken, from: Option<String>, to: Option<String>) {
        self.draft.period = Some(token);
        self.draft.custom_from = from;
        self.draft.custom_to = to;
        self.edited.insert(FilterKey::Period);
    }

    /// Stage a status selection.
    pub fn stage_status(&mut self, values: Vec<String>) {
        self.draft.status = values;
        self.edited.insert(FilterKey::Status);
    }

    /// Stage an owner selection.
    pub fn stage_owner(&mut self, values: Vec<String>) {
        self.draft.owner = values;
        self.edited.insert(FilterKey::Owner);
    }

    /// Stage a lead-source selection.
    pub fn stage_source(&mut self, values: Vec<String>) {
        self.draft.source = values;
        self.edited.insert(FilterKey::Source);
    }

    /// Stage a search term; `None` clears it.
    pub fn stage_search(&mut self, term: Option<String>) {
        self.draft.search = term;
        self.edited.insert(FilterKey::Search);
    }

    /// Stage every field back to its default. Does not commit; a subsequent
    /// [StagedFilterController::apply] performs the navigation.
    pub fn clear_all(&mut self) {
        for &key in FilterKey::ALL {
            self.draft.clear_field(key);
            self.edited.insert(key);
        }
    }

    /// Atomically commit the staged edits.
    ///
    /// Only the edited keys are merged, over a fresh read of committed state
    /// rather than the snapshot taken at `open`. That re-read is what keeps a
    /// concurrent immediate removal of an unrelated field from being
    /// clobbered by this apply.
    ///
    /// # Errors
    /// On a rejected or failed commit the surface stays in
    /// [StagePhase::Staging] with the draft untouched so the user can retry;
    /// committed state and the URL are unchanged.
    pub async fn apply(&mut self) -> Result<(), Error> {
        let mut merged = self.store.read();
        for &key in &self.edited {
            merged.copy_field(key, &self.draft);
        }

        self.committed = self.store.commit(&merged, true).await?;
        self.draft = self.committed.clone();
        self.edited.clear();
        self.phase = StagePhase::Idle;

        Ok(())
    }

    /// Discard the draft with no URL mutation.
    pub fn cancel(&mut self) {
        self.draft = self.committed.clone();
        self.edited.clear();
        self.phase = StagePhase::Idle;
    }

    /// Reset one committed field immediately, e.g. a filter chip's "×".
    ///
    /// Available in either phase. Never touches the draft: a pending staged
    /// edit of a different field survives and stays pending until the user
    /// applies or cancels.
    ///
    /// # Errors
    /// Returns the commit error unchanged; committed state is not updated.
    pub async fn remove_committed(&mut self, key: FilterKey) -> Result<(), Error> {
        self.commit_immediate(|state| state.clear_field(key)).await
    }

    /// Apply `edit` to the current committed state and commit it in one
    /// step, for immediate-apply surfaces.
    ///
    /// # Errors
    /// Returns the commit error unchanged; committed state is not updated.
    pub async fn commit_immediate(
        &mut self,
        edit: impl FnOnce(&mut FilterState),
    ) -> Result<(), Error> {
        let mut next = self.store.read();
        edit(&mut next);

        self.committed = self.store.commit(&next, true).await?;

        if self.phase == StagePhase::Idle {
            self.draft = self.committed.clone();
        }

        Ok(())
    }
}
