//! Defines the error type shared across the filter engine.

/// The errors that may occur while committing or validating filter state.
///
/// Malformed filter *input* (bad period tokens, unparsable custom dates) is
/// never an error: it resolves to a safe default because filters are advisory
/// UI state. This enum only covers failures the caller must react to.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A downstream handler rejected the filter values before navigation.
    ///
    /// The staging surface should stay open so the user can correct the
    /// values and retry.
    #[error("filter change was rejected: {0}")]
    Validation(String),

    /// The replace-navigation primitive failed to apply the new query string.
    ///
    /// Nothing was committed; the previous URL state is still in effect.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Tried to deselect the only remaining export column.
    ///
    /// The selection is unchanged. Callers should surface this to the user
    /// rather than treat it as a fault.
    #[error("at least one column must remain selected")]
    LastColumnRequired,

    /// An unexpected failure from a collaborator.
    #[error("an unexpected error occurred: {0}")]
    Unknown(String),
}
