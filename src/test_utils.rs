//! Shared in-memory fakes for the URL ports.

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::Error,
    url_store::{NavigateOptions, Navigator, QuerySource},
};

/// An in-memory stand-in for the browser location.
///
/// Clones share the same underlying state, so one instance can serve as both
/// the query source and the navigator of a store while the test keeps a
/// handle for assertions.
#[derive(Clone)]
pub struct FakeLocation {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    query: String,
    replace_calls: Vec<String>,
    fail_with: Option<Error>,
}

impl FakeLocation {
    pub fn with_query(query: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                query: query.to_owned(),
                replace_calls: Vec::new(),
                fail_with: None,
            })),
        }
    }

    /// The current query string.
    pub fn query(&self) -> String {
        self.inner.borrow().query.clone()
    }

    /// Overwrite the query string without going through navigation, as if
    /// another subsystem had changed the URL.
    pub fn set_query(&self, query: &str) {
        self.inner.borrow_mut().query = query.to_owned();
    }

    /// Every path-and-query passed to [Navigator::replace], in order.
    pub fn replace_calls(&self) -> Vec<String> {
        self.inner.borrow().replace_calls.clone()
    }

    /// Make the next replace call fail with `error`.
    pub fn fail_next_with(&self, error: Error) {
        self.inner.borrow_mut().fail_with = Some(error);
    }
}

impl QuerySource for FakeLocation {
    fn current_query(&self) -> String {
        self.query()
    }
}

impl Navigator for FakeLocation {
    async fn replace(
        &mut self,
        path_and_query: &str,
        _options: NavigateOptions,
    ) -> Result<(), Error> {
        let mut inner = self.inner.borrow_mut();

        if let Some(error) = inner.fail_with.take() {
            return Err(error);
        }

        inner.replace_calls.push(path_and_query.to_owned());
        inner.query = path_and_query
            .split_once('?')
            .map(|(_, query)| query.to_owned())
            .unwrap_or_default();

        Ok(())
    }
}
