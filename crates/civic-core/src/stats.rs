//! Summary counts over the unfiltered issue collection.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Category, Issue, IssueStatus};

/// Totals shown above the issue table. Never depends on the active filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct IssueStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub by_category: BTreeMap<Category, usize>,
}

impl IssueStats {
    #[must_use]
    pub fn from_issues(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut stats, issue| {
            stats.total += 1;
            match issue.status {
                IssueStatus::Pending => stats.pending += 1,
                IssueStatus::InProgress => stats.in_progress += 1,
                IssueStatus::Resolved => stats.resolved += 1,
            }
            *stats.by_category.entry(issue.category).or_default() += 1;
            stats
        })
    }

    #[must_use]
    pub const fn count(&self, status: IssueStatus) -> usize {
        match status {
            IssueStatus::Pending => self.pending,
            IssueStatus::InProgress => self.in_progress,
            IssueStatus::Resolved => self.resolved,
        }
    }
}
