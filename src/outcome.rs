//! Result combinators used for agent-level control flow
//!
//! `std::result::Result` already gives us `map`, `and_then` (flat map),
//! `map_err`, `unwrap_or` and `unwrap_or_else`. This module adds the pieces
//! the framework relies on beyond that: chaining side-effect hooks and the
//! two aggregation helpers.

use crate::error::AgentError;

/// Side-effect hooks that hand the original result back for chaining.
///
/// Neither hook can change which branch the result represents.
pub trait ResultExt<T, E>: Sized {
    fn on_success<F: FnOnce(&T)>(self, f: F) -> Self;
    fn on_failure<F: FnOnce(&E)>(self, f: F) -> Self;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn on_success<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(value) = &self {
            f(value);
        }
        self
    }

    fn on_failure<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(error) = &self {
            f(error);
        }
        self
    }
}

/// Collect results into one result holding every value.
///
/// Scans left to right and stops at the first failure; later items are not
/// inspected.
pub fn collect_results<T, E, I>(results: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = Result<T, E>>,
{
    let mut values = Vec::new();
    for result in results {
        values.push(result?);
    }
    Ok(values)
}

/// Return the first success, or the *last* failure when nothing succeeded.
///
/// Keeping the last failure reports the most recent attempt of a cascading
/// fallback (cache, then database, then API). An empty input is a validation
/// failure.
pub fn first_success<T, I>(results: I) -> Result<T, AgentError>
where
    I: IntoIterator<Item = Result<T, AgentError>>,
{
    let mut last_failure = None;
    for result in results {
        match result {
            Ok(value) => return Ok(value),
            Err(e) => last_failure = Some(e),
        }
    }
    Err(last_failure.unwrap_or_else(|| AgentError::validation(["No results provided"])))
}
