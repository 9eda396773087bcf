//! Binds the filter codec to the host environment's URL.
//!
//! The URL is the one shared mutable resource in the subsystem, so all reads
//! go through [QuerySource] and every write goes through
//! [UrlFilterStore::commit], the single serialization point.

use std::future::Future;

use crate::{
    error::Error,
    filter::{FilterSchema, FilterState, decode, encode},
};

/// Options forwarded to the navigation primitive.
#[derive(Debug, Clone, Copy)]
pub struct NavigateOptions {
    /// Keep the current scroll position instead of restoring to top.
    pub keep_scroll: bool,
}

/// Read access to the current location's query string.
///
/// Conceptually the browser's `location.search`; injected so tests can run
/// against an in-memory stand-in.
pub trait QuerySource {
    /// The current query string, with or without a leading `?`.
    fn current_query(&self) -> String;
}

/// The history-replacing navigation primitive.
///
/// Called at most once per commit. Replace semantics matter: N filter edits
/// must not cost the user N back-button presses.
pub trait Navigator {
    /// Replace the current history entry with `path_and_query`.
    ///
    /// May be asynchronous (e.g. a router that awaits a downstream effect
    /// before navigating). An error means nothing was committed.
    fn replace(
        &mut self,
        path_and_query: &str,
        options: NavigateOptions,
    ) -> impl Future<Output = Result<(), Error>>;
}

/// Stateful adapter between filter state and the URL.
pub struct UrlFilterStore<Q, N> {
    source: Q,
    navigator: N,
    schema: FilterSchema,
    path: String,
}

impl<Q: QuerySource, N: Navigator> UrlFilterStore<Q, N> {
    /// Create a store for the page at `path`.
    pub fn new(source: Q, navigator: N, schema: FilterSchema, path: impl Into<String>) -> Self {
        Self {
            source,
            navigator,
            schema,
            path: path.into(),
        }
    }

    /// The page's filter schema.
    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    /// Decode the current query string into filter state.
    pub fn read(&self) -> FilterState {
        decode(&self.source.current_query(), &self.schema)
    }

    /// Commit `next` to the URL with a single replace navigation.
    ///
    /// Unowned keys are taken from the *current* raw query rather than from
    /// `next`, so a stale snapshot can never clobber pagination or other
    /// subsystems' state. When `reset_page` is set, an existing `page` key is
    /// rewritten to `1`; an absent key stays absent (absent already means
    /// page 1).
    ///
    /// # Errors
    /// Returns the navigation error unchanged; the caller must treat the
    /// commit as failed and the previous URL state as still in effect.
    pub async fn commit(
        &mut self,
        next: &FilterState,
        reset_page: bool,
    ) -> Result<FilterState, Error> {
        let current = decode(&self.source.current_query(), &self.schema);

        let mut merged = next.clone();
        merged.extra = current.extra;

        if reset_page {
            for (key, value) in &mut merged.extra {
                if key == "page" {
                    *value = "1".to_owned();
                }
            }
        }

        let query = encode(&merged, &self.schema);
        let target = if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{query}", self.path)
        };

        tracing::debug!("committing filter query {target:?}");

        self.navigator
            .replace(&target, NavigateOptions { keep_scroll: true })
            .await?;

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::Error,
        filter::{FilterSchema, FilterState},
        test_utils::FakeLocation,
    };

    use super::UrlFilterStore;

    fn leads_store(location: &FakeLocation) -> UrlFilterStore<FakeLocation, FakeLocation> {
        UrlFilterStore::new(
            location.clone(),
            location.clone(),
            FilterSchema::leads(),
            "/leads",
        )
    }

    #[test]
    fn read_decodes_the_current_query() {
        let location = FakeLocation::with_query("status=new&owner=user-1");
        let store = leads_store(&location);

        let got = store.read();

        assert_eq!(got.status, vec!["new".to_owned()]);
        assert_eq!(got.owner, vec!["user-1".to_owned()]);
    }

    #[tokio::test]
    async fn commit_navigates_exactly_once_with_replace() {
        let location = FakeLocation::with_query("");
        let mut store = leads_store(&location);
        let next = FilterState {
            status: vec!["new".to_owned()],
            ..Default::default()
        };

        store.commit(&next, true).await.unwrap();

        assert_eq!(location.replace_calls(), vec!["/leads?status=new"]);
    }

    #[tokio::test]
    async fn commit_resets_an_existing_page_key_and_keeps_unrelated_params() {
        let location = FakeLocation::with_query("page=5&theme=dark");
        let mut store = leads_store(&location);
        let next = FilterState {
            owner: vec!["user-2".to_owned()],
            ..store.read()
        };

        store.commit(&next, true).await.unwrap();

        assert_eq!(location.query(), "owner=user-2&page=1&theme=dark");
    }

    #[tokio::test]
    async fn commit_leaves_an_absent_page_key_absent() {
        let location = FakeLocation::with_query("");
        let mut store = leads_store(&location);
        let next = FilterState {
            owner: vec!["user-2".to_owned()],
            ..Default::default()
        };

        store.commit(&next, true).await.unwrap();

        assert_eq!(location.query(), "owner=user-2");
    }

    #[tokio::test]
    async fn commit_of_default_state_navigates_to_the_bare_path() {
        let location = FakeLocation::with_query("status=new");
        let mut store = leads_store(&location);

        store.commit(&FilterState::default(), true).await.unwrap();

        assert_eq!(location.replace_calls(), vec!["/leads"]);
        assert_eq!(location.query(), "");
    }

    #[tokio::test]
    async fn failed_navigation_leaves_the_location_untouched() {
        let location = FakeLocation::with_query("status=new");
        location.fail_next_with(Error::Navigation("router offline".to_owned()));
        let mut store = leads_store(&location);
        let next = FilterState {
            owner: vec!["user-2".to_owned()],
            ..Default::default()
        };

        let got = store.commit(&next, true).await;

        assert_eq!(got, Err(Error::Navigation("router offline".to_owned())));
        assert_eq!(location.query(), "status=new");
        assert!(location.replace_calls().is_empty());
    }

    #[tokio::test]
    async fn commit_takes_unowned_keys_from_the_current_query_not_the_snapshot() {
        let location = FakeLocation::with_query("status=new&page=3");
        let mut store = leads_store(&location);
        // A snapshot taken before someone else changed the page.
        let stale = FilterState {
            status: vec!["closed".to_owned()],
            extra: vec![("page".to_owned(), "1".to_owned())],
            ..Default::default()
        };

        location.set_query("status=new&page=7");
        store.commit(&stale, false).await.unwrap();

        assert_eq!(location.query(), "status=closed&page=7");
    }
}
