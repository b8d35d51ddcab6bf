//! Issue administration state machine.
//!
//! [`IssueAdminController`] owns the local issue collection and the filter
//! predicate, derives the filtered view, and runs mutating actions against the
//! remote store. It never patches the collection optimistically: every
//! mutation, successful or not, is followed by a full reload so the local copy
//! reflects remote truth.
//!
//! Mutations are single-flight. The [`ActionLock`] is taken before the remote
//! call and released by its guard on every exit path; a mutation requested
//! while the lock is held is rejected, not queued.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::api::{ApiError, IssueApi};
use crate::error::ErrorCode;
use crate::filter::{FilterPatch, FilterPredicate, FilteredView};
use crate::lock::ActionLock;
use crate::model::{Issue, IssueId, IssueStatus};
use crate::notice::{Notice, NoticeQueue};
use crate::stats::IssueStats;

/// Which mutation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    UpdateStatus,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UpdateStatus => "update status of",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// `reload()` failed; the previous collection was kept.
    #[error("failed to fetch issues: {0}")]
    Fetch(#[source] ApiError),
    /// A status update or delete failed; the collection was reloaded.
    #[error("failed to {action} issue '{id}': {source}")]
    Mutation {
        action: MutationKind,
        id: IssueId,
        #[source]
        source: ApiError,
    },
    #[error("another action is still in progress")]
    ActionInProgress,
    #[error("deletion of issue '{0}' was not confirmed")]
    NotConfirmed(IssueId),
    #[error("issue '{0}' not found")]
    IssueNotFound(IssueId),
}

impl AdminError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Fetch(source) => source.code(ErrorCode::FetchFailed),
            Self::Mutation { source, .. } => source.code(ErrorCode::MutationFailed),
            Self::ActionInProgress => ErrorCode::ActionInProgress,
            Self::NotConfirmed(_) => ErrorCode::ConfirmationRequired,
            Self::IssueNotFound(_) => ErrorCode::IssueNotFound,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Explicit confirmation step in front of a destructive delete.
pub trait ConfirmDelete {
    /// Ask whether issue `id` (titled `title`, when it is in the local
    /// collection) should really be deleted.
    fn confirm_delete(&mut self, id: &IssueId, title: Option<&str>) -> bool;
}

/// Confirmation already obtained out of band, e.g. a `--yes` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreConfirmed;

impl ConfirmDelete for PreConfirmed {
    fn confirm_delete(&mut self, _id: &IssueId, _title: Option<&str>) -> bool {
        true
    }
}

/// Read-only view handed to the presentation layer each render cycle.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub issues: Vec<&'a Issue>,
    pub stats: IssueStats,
    pub filter: &'a FilterPredicate,
    pub loading: bool,
    pub action_locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<&'a Issue>,
    pub notices: &'a [Notice],
}

pub struct IssueAdminController<A> {
    api: A,
    /// Authoritative local copy, replaced wholesale on each successful reload.
    issues: Vec<Issue>,
    /// Bumped on every collection replacement; keys the filtered view.
    generation: u64,
    filter: FilterPredicate,
    view: FilteredView,
    loading: bool,
    lock: ActionLock,
    selected: Option<IssueId>,
    notices: NoticeQueue,
}

impl<A: IssueApi> IssueAdminController<A> {
    /// Controller with an empty collection. Call [`mount`](Self::mount) to load it.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_lock(api, ActionLock::new())
    }

    /// Controller sharing an existing single-flight lock.
    #[must_use]
    pub fn with_lock(api: A, lock: ActionLock) -> Self {
        Self {
            api,
            issues: Vec::new(),
            generation: 0,
            filter: FilterPredicate::default(),
            view: FilteredView::default(),
            loading: true,
            lock,
            selected: None,
            notices: NoticeQueue::default(),
        }
    }

    /// Initial load when the view is entered.
    ///
    /// # Errors
    ///
    /// Same as [`reload`](Self::reload).
    pub fn mount(&mut self) -> Result<(), AdminError> {
        info!("issue admin view mounted");
        self.reload()
    }

    /// Fetch the full collection and replace the local copy.
    ///
    /// On failure the previous collection is kept and an error notice is raised.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Fetch`] when the remote call fails.
    pub fn reload(&mut self) -> Result<(), AdminError> {
        self.loading = true;
        let fetched = self.api.fetch_issues();
        self.loading = false;

        match fetched {
            Ok(issues) => {
                debug!(count = issues.len(), "issue collection replaced");
                self.issues = issues;
                self.generation += 1;
                self.recompute();
                Ok(())
            }
            Err(err) => {
                warn!("issue reload failed, keeping {} cached issues: {err}", self.issues.len());
                self.notices.push(Notice::error("Failed to fetch issues"));
                Err(AdminError::Fetch(err))
            }
        }
    }

    /// Merge a partial filter update and recompute the filtered view.
    /// Returns whether the predicate changed.
    pub fn set_filter(&mut self, patch: FilterPatch) -> bool {
        let changed = self.filter.merge(patch);
        self.recompute();
        changed
    }

    /// Move one issue to `status`, then reload.
    ///
    /// # Errors
    ///
    /// [`AdminError::ActionInProgress`] if another mutation holds the lock (no
    /// remote call is made), or [`AdminError::Mutation`] if the update failed.
    pub fn set_status(&mut self, id: &IssueId, status: IssueStatus) -> Result<(), AdminError> {
        let guard = self.lock.try_acquire().map_err(|_| {
            warn!(issue = %id, "status change rejected: action in progress");
            AdminError::ActionInProgress
        })?;

        info!(issue = %id, %status, "updating issue status");
        let outcome = self.api.update_status(id, status);
        match &outcome {
            Ok(()) => self
                .notices
                .push(Notice::success(format!("Issue status updated to {status}"))),
            Err(err) => {
                warn!(issue = %id, "status update failed: {err}");
                self.notices.push(Notice::error("Failed to update issue status"));
            }
        }

        self.reload_after_mutation();
        guard.release();

        outcome.map_err(|source| AdminError::Mutation {
            action: MutationKind::UpdateStatus,
            id: id.clone(),
            source,
        })
    }

    /// Delete one issue after an explicit confirmation, then reload.
    ///
    /// # Errors
    ///
    /// [`AdminError::ActionInProgress`] if the lock is held,
    /// [`AdminError::NotConfirmed`] if confirmation was declined (neither makes
    /// a remote call), or [`AdminError::Mutation`] if the delete failed.
    pub fn delete_issue(
        &mut self,
        id: &IssueId,
        mut confirm: impl ConfirmDelete,
    ) -> Result<(), AdminError> {
        if self.lock.is_held() {
            warn!(issue = %id, "delete rejected: action in progress");
            return Err(AdminError::ActionInProgress);
        }

        let title = self.issue(id).map(|issue| issue.title.as_str());
        if !confirm.confirm_delete(id, title) {
            info!(issue = %id, "delete not confirmed");
            return Err(AdminError::NotConfirmed(id.clone()));
        }

        let guard = self
            .lock
            .try_acquire()
            .map_err(|_| AdminError::ActionInProgress)?;

        info!(issue = %id, "deleting issue");
        let outcome = self.api.delete_issue(id);
        match &outcome {
            Ok(()) => self.notices.push(Notice::success("Issue deleted successfully")),
            Err(err) => {
                warn!(issue = %id, "delete failed: {err}");
                self.notices.push(Notice::error("Failed to delete issue"));
            }
        }

        self.reload_after_mutation();
        guard.release();

        outcome.map_err(|source| AdminError::Mutation {
            action: MutationKind::Delete,
            id: id.clone(),
            source,
        })
    }

    /// Select an issue for detail display. Purely local; allowed while locked.
    ///
    /// # Errors
    ///
    /// [`AdminError::IssueNotFound`] if the id is not in the current collection.
    pub fn view_details(&mut self, id: &IssueId) -> Result<&Issue, AdminError> {
        let Some(pos) = self.issues.iter().position(|issue| issue.id == *id) else {
            return Err(AdminError::IssueNotFound(id.clone()));
        };
        self.selected = Some(id.clone());
        Ok(&self.issues[pos])
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    fn reload_after_mutation(&mut self) {
        // Failure already raised its own notice; the mutation outcome is what we report.
        if let Err(err) = self.reload() {
            debug!("reload after mutation failed: {err}");
        }
    }

    fn recompute(&mut self) {
        if self.view.refresh(self.generation, &self.filter, &self.issues) {
            debug!(visible = self.view.len(), total = self.issues.len(), "filtered view recomputed");
        }
    }
}

impl<A> IssueAdminController<A> {
    /// The unfiltered collection, in API order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn issue(&self, id: &IssueId) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == *id)
    }

    /// Issues matching the active filter, in collection order.
    pub fn filtered(&self) -> impl Iterator<Item = &Issue> + '_ {
        self.view.positions().iter().map(|&pos| &self.issues[pos])
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterPredicate {
        &self.filter
    }

    /// Counts over the unfiltered collection.
    #[must_use]
    pub fn stats(&self) -> IssueStats {
        IssueStats::from_issues(&self.issues)
    }

    /// Issue currently selected for detail display, if it still exists.
    #[must_use]
    pub fn selected(&self) -> Option<&Issue> {
        self.selected.as_ref().and_then(|id| self.issue(id))
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Handle onto the single-flight lock shared with this controller.
    #[must_use]
    pub const fn action_lock(&self) -> &ActionLock {
        &self.lock
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        self.notices.pending()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn expire_notices(&mut self, ttl: Duration) {
        self.notices.expire(ttl, Instant::now());
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        DashboardSnapshot {
            issues: self.filtered().collect(),
            stats: self.stats(),
            filter: &self.filter,
            loading: self.loading,
            action_locked: self.is_locked(),
            selected: self.selected(),
            notices: self.notices.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Choice;
    use crate::model::Category;
    use std::cell::{Cell, RefCell};

    fn issue(id: &str, title: &str, status: IssueStatus, category: Category) -> Issue {
        Issue {
            id: IssueId::new(id),
            title: title.to_string(),
            description: None,
            location: None,
            category,
            status,
            created_by: None,
            created_at: None,
            critical: false,
            upvotes: 0,
        }
    }

    /// In-memory remote store with switchable failures.
    #[derive(Default)]
    struct FakeApi {
        store: RefCell<Vec<Issue>>,
        fail_fetch: Cell<bool>,
        fail_mutations: Cell<bool>,
        fetches: Cell<usize>,
        mutations: Cell<usize>,
    }

    impl FakeApi {
        fn with(issues: Vec<Issue>) -> Self {
            Self {
                store: RefCell::new(issues),
                ..Self::default()
            }
        }
    }

    impl IssueApi for FakeApi {
        fn fetch_issues(&self) -> Result<Vec<Issue>, ApiError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.fail_fetch.get() {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            Ok(self.store.borrow().clone())
        }

        fn update_status(&self, id: &IssueId, status: IssueStatus) -> Result<(), ApiError> {
            self.mutations.set(self.mutations.get() + 1);
            if self.fail_mutations.get() {
                return Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let mut store = self.store.borrow_mut();
            let found = store.iter_mut().find(|i| i.id == *id).ok_or(ApiError::Status {
                status: 404,
                message: "Issue not found".to_string(),
            })?;
            found.status = status;
            Ok(())
        }

        fn delete_issue(&self, id: &IssueId) -> Result<(), ApiError> {
            self.mutations.set(self.mutations.get() + 1);
            if self.fail_mutations.get() {
                return Err(ApiError::Transport("reset".to_string()));
            }
            self.store.borrow_mut().retain(|i| i.id != *id);
            Ok(())
        }
    }

    struct Decline(usize);

    impl ConfirmDelete for &mut Decline {
        fn confirm_delete(&mut self, _id: &IssueId, _title: Option<&str>) -> bool {
            self.0 += 1;
            false
        }
    }

    fn seeded() -> FakeApi {
        FakeApi::with(vec![
            issue("1", "Pothole", IssueStatus::Pending, Category::Infrastructure),
            issue("2", "Broken light", IssueStatus::Resolved, Category::Safety),
        ])
    }

    #[test]
    fn starts_empty_and_loading_until_mounted() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        assert!(controller.issues().is_empty());
        assert!(controller.is_loading());

        controller.mount().unwrap();
        assert!(!controller.is_loading());
        assert_eq!(controller.issues().len(), 2);
        assert_eq!(controller.filtered().count(), 2);
    }

    #[test]
    fn failed_reload_keeps_previous_collection() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();

        api.fail_fetch.set(true);
        let err = controller.reload().unwrap_err();
        assert!(matches!(err, AdminError::Fetch(_)));
        assert_eq!(err.code(), ErrorCode::FetchFailed);
        assert_eq!(controller.issues().len(), 2);
        assert!(!controller.is_loading());
        assert_eq!(controller.notices().len(), 1);
        assert!(controller.notices()[0].is_error());
    }

    #[test]
    fn stats_ignore_filter() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();

        controller.set_filter(FilterPatch::status(Choice::Only(IssueStatus::Pending)));
        let visible: Vec<_> = controller.filtered().map(|i| i.id.as_str()).collect();
        assert_eq!(visible, ["1"]);

        let stats = controller.stats();
        assert_eq!((stats.total, stats.pending, stats.in_progress, stats.resolved), (2, 1, 0, 1));
    }

    #[test]
    fn set_status_reloads_and_releases_lock() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();

        controller.set_status(&IssueId::new("1"), IssueStatus::InProgress).unwrap();
        assert_eq!(api.fetches.get(), 2);
        assert_eq!(
            controller.issue(&IssueId::new("1")).unwrap().status,
            IssueStatus::InProgress
        );
        assert!(!controller.is_locked());
        let notices = controller.drain_notices();
        assert_eq!(notices[0].message, "Issue status updated to IN_PROGRESS");
    }

    #[test]
    fn failed_mutation_still_reloads_and_releases_lock() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();
        api.fail_mutations.set(true);

        let err = controller
            .set_status(&IssueId::new("1"), IssueStatus::Resolved)
            .unwrap_err();
        assert!(matches!(err, AdminError::Mutation { action: MutationKind::UpdateStatus, .. }));
        assert_eq!(err.code(), ErrorCode::MutationFailed);
        assert_eq!(api.fetches.get(), 2);
        assert!(!controller.is_locked());
        assert_eq!(controller.notices()[0].message, "Failed to update issue status");

        let err = controller.delete_issue(&IssueId::new("2"), PreConfirmed).unwrap_err();
        assert!(matches!(err, AdminError::Mutation { action: MutationKind::Delete, .. }));
        assert!(!controller.is_locked());
        assert_eq!(controller.issues().len(), 2);
    }

    #[test]
    fn held_lock_rejects_mutations_without_remote_call() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();

        let held = controller.action_lock().try_acquire().unwrap();
        assert!(matches!(
            controller.set_status(&IssueId::new("1"), IssueStatus::Resolved),
            Err(AdminError::ActionInProgress)
        ));
        assert!(matches!(
            controller.delete_issue(&IssueId::new("1"), PreConfirmed),
            Err(AdminError::ActionInProgress)
        ));
        assert_eq!(api.mutations.get(), 0);

        // Detail selection is independent of the lock.
        assert!(controller.view_details(&IssueId::new("2")).is_ok());
        drop(held);
        assert!(controller.set_status(&IssueId::new("1"), IssueStatus::Resolved).is_ok());
    }

    #[test]
    fn declined_delete_makes_no_remote_call() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();

        let mut decline = Decline(0);
        let err = controller.delete_issue(&IssueId::new("2"), &mut decline).unwrap_err();
        assert!(matches!(err, AdminError::NotConfirmed(_)));
        assert_eq!(err.code(), ErrorCode::ConfirmationRequired);
        assert_eq!(decline.0, 1);
        assert_eq!(api.mutations.get(), 0);
        assert_eq!(controller.issues().len(), 2);
    }

    #[test]
    fn confirmed_delete_removes_issue_and_clears_stale_selection() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();
        controller.view_details(&IssueId::new("2")).unwrap();

        controller.delete_issue(&IssueId::new("2"), PreConfirmed).unwrap();
        assert_eq!(controller.issues().len(), 1);
        assert!(controller.selected().is_none());
        assert_eq!(controller.notices()[0].message, "Issue deleted successfully");
    }

    #[test]
    fn view_details_is_local_and_close_clears() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();
        let fetches = api.fetches.get();

        assert_eq!(controller.view_details(&IssueId::new("1")).unwrap().title, "Pothole");
        assert!(matches!(
            controller.view_details(&IssueId::new("99")),
            Err(AdminError::IssueNotFound(_))
        ));
        assert_eq!(controller.selected().map(|i| i.id.as_str()), Some("1"));
        assert_eq!(api.fetches.get(), fetches);

        controller.close_details();
        assert!(controller.selected().is_none());
    }

    #[test]
    fn snapshot_reflects_filter_and_lock() {
        let api = seeded();
        let mut controller = IssueAdminController::new(&api);
        controller.mount().unwrap();
        controller.set_filter(FilterPatch::search("light"));

        let _held = controller.action_lock().try_acquire().unwrap();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.issues.len(), 1);
        assert_eq!(snapshot.stats.total, 2);
        assert!(snapshot.action_locked);
        assert!(!snapshot.loading);
    }
}
