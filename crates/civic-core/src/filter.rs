//! Search/status/category predicate and the memoized view derived from it.

use serde::{Serialize, Serializer};
use std::{fmt, str::FromStr};

use crate::model::{Category, Issue, IssueStatus};

/// A filter slot: either unconstrained or pinned to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Choice<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Choice<T> {
    /// `All` accepts anything; `Only(v)` requires exact equality.
    #[must_use]
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl<T: fmt::Display> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Active filter criteria. Process-local, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterPredicate {
    pub search_term: String,
    pub status: Choice<IssueStatus>,
    pub category: Choice<Category>,
}

/// Partial update merged into a [`FilterPredicate`]; `None` leaves a slot as is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub search_term: Option<String>,
    pub status: Option<Choice<IssueStatus>>,
    pub category: Option<Choice<Category>>,
}

impl FilterPatch {
    #[must_use]
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(status: Choice<IssueStatus>) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category(category: Choice<Category>) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }
}

impl FilterPredicate {
    /// Returns true if no filter criteria are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && matches!(self.status, Choice::All)
            && matches!(self.category, Choice::All)
    }

    /// Merge `patch` into this predicate. Returns whether anything changed.
    pub fn merge(&mut self, patch: FilterPatch) -> bool {
        let before = self.clone();
        if let Some(term) = patch.search_term {
            self.search_term = term;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        *self != before
    }

    /// Returns true if the issue satisfies all active criteria.
    ///
    /// The search term matches case-insensitively as a substring of the
    /// title, description, or location; absent fields never match.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        if !self.status.accepts(&issue.status) || !self.category.accepts(&issue.category) {
            return false;
        }
        if self.search_term.is_empty() {
            return true;
        }

        let needle = self.search_term.to_lowercase();
        [
            Some(issue.title.as_str()),
            issue.description.as_deref(),
            issue.location.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Positions in `issues` that satisfy this predicate, in collection order.
    #[must_use]
    pub fn positions(&self, issues: &[Issue]) -> Vec<usize> {
        issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| self.matches(issue))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Filtered view over a collection, keyed on (collection generation, predicate).
///
/// Holds positions only; the issues themselves stay in the collection.
#[derive(Debug, Clone, Default)]
pub struct FilteredView {
    key: Option<(u64, FilterPredicate)>,
    positions: Vec<usize>,
}

impl FilteredView {
    /// Recompute unless the inputs match the last computation.
    /// Returns whether a recomputation happened.
    pub fn refresh(&mut self, generation: u64, predicate: &FilterPredicate, issues: &[Issue]) -> bool {
        if let Some((cached_generation, cached_predicate)) = &self.key
            && *cached_generation == generation
            && cached_predicate == predicate
        {
            return false;
        }

        self.positions = predicate.positions(issues);
        self.key = Some((generation, predicate.clone()));
        true
    }

    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
