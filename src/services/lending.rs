//! Lending policy: loan requests, returns and the overdue sweep
//!
//! Every mutation for a given user and work runs under that user's lock and
//! that work's lock (always acquired in that order), so the validate → take
//! copy → record loan → persist sequence is atomic per user and per work.

use std::sync::Arc;

use indexmap::IndexSet;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult, DenialReason},
    models::{Loan, OverdueEntry, Role, User},
    repository::PersistenceAdapter,
};

use super::{
    catalog::Catalog, clock::Clock, ledger::LoanLedger, locks::KeyedLocks, users::UserDirectory,
};

pub struct LendingService {
    catalog: Arc<Catalog>,
    ledger: Arc<LoanLedger>,
    directory: Arc<UserDirectory>,
    repository: Arc<dyn PersistenceAdapter>,
    clock: Arc<dyn Clock>,
    user_locks: KeyedLocks<String>,
    work_locks: KeyedLocks<i32>,
    /// Serializes snapshot-then-save so a slow save never lands last with stale data
    persist_lock: Mutex<()>,
}

impl LendingService {
    pub fn new(
        catalog: Arc<Catalog>,
        ledger: Arc<LoanLedger>,
        directory: Arc<UserDirectory>,
        repository: Arc<dyn PersistenceAdapter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            directory,
            repository,
            clock,
            user_locks: KeyedLocks::new(),
            work_locks: KeyedLocks::new(),
            persist_lock: Mutex::new(()),
        }
    }

    /// Lend one copy of `work_id` to `email`.
    ///
    /// Checks run in a fixed order and stop at the first failure: role,
    /// blocked flag, loan limit, then availability.
    pub async fn request_loan(&self, email: &str, work_id: i32) -> AppResult<Loan> {
        let _user_guard = self.user_locks.lock(&email.to_string()).await;
        let user = self.directory.find_by_email(email).await?;

        if user.role() == Role::Librarian {
            return Err(deny(&user, work_id, DenialReason::LibrarianCannotBorrow));
        }
        if user.blocked {
            return Err(deny(&user, work_id, DenialReason::UserBlocked));
        }
        let active = self.ledger.active_loans_for(email).await;
        if active >= user.borrow_limit() {
            return Err(deny(&user, work_id, DenialReason::LimitReached));
        }

        let _work_guard = self.work_locks.lock(&work_id).await;
        let work = self.catalog.find_by_id(work_id).await?;
        if !work.is_available() {
            return Err(deny(&user, work_id, DenialReason::NoCopiesAvailable));
        }

        // Re-checked inside the catalog's write lock
        let work = match self.catalog.checkout(work_id).await {
            Ok(work) => work,
            Err(AppError::Denied(reason)) => return Err(deny(&user, work_id, reason)),
            Err(e) => return Err(e),
        };

        let loan = Loan::new(email, work_id, self.clock.today());
        self.ledger.append(loan.clone()).await;
        self.persist_lending_state().await;

        tracing::info!(
            email,
            work_id,
            due_date = %loan.due_date,
            remaining = work.available_copies,
            "Loan granted"
        );
        Ok(loan)
    }

    /// Close the active loan of `work_id` held by `email` and restock the copy.
    ///
    /// When `processed_by` names a librarian, their return counter goes up.
    /// Naming anyone else fails before anything is mutated.
    pub async fn register_return(
        &self,
        email: &str,
        work_id: i32,
        processed_by: Option<&str>,
    ) -> AppResult<Loan> {
        if let Some(librarian) = processed_by {
            let clerk = self.directory.find_by_email(librarian).await?;
            if clerk.role() != Role::Librarian {
                return Err(AppError::Validation(format!(
                    "{} is not a librarian",
                    librarian
                )));
            }
        }

        let _user_guard = self.user_locks.lock(&email.to_string()).await;
        let _work_guard = self.work_locks.lock(&work_id).await;

        let loan = self.ledger.mark_returned(email, work_id).await?;
        if let Err(e) = self.catalog.return_copy(work_id).await {
            tracing::warn!(email, work_id, error = %e, "Returned loan references a work missing from the catalog");
        }
        self.persist_lending_state().await;

        if let Some(librarian) = processed_by {
            self.directory.record_return_processed(librarian).await?;
        }

        tracing::info!(email, work_id, "Loan returned");
        Ok(loan)
    }

    /// Block every user holding at least one overdue loan.
    ///
    /// Never unblocks anyone. Works on a snapshot of the ledger and takes only
    /// the per-user lock while flipping each flag. Returns the emails that were
    /// newly blocked by this pass.
    pub async fn overdue_sweep(&self) -> Vec<String> {
        let today = self.clock.today();
        let delinquent: IndexSet<String> = self
            .ledger
            .overdue(today)
            .await
            .into_iter()
            .map(|loan| loan.email)
            .collect();

        let mut newly_blocked = Vec::new();
        for email in delinquent {
            let _user_guard = self.user_locks.lock(&email).await;
            match self.directory.set_blocked(&email, true).await {
                Ok(true) => newly_blocked.push(email),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(email = %email, error = %e, "Overdue loan belongs to an unknown user")
                }
            }
        }

        tracing::info!(%today, blocked = newly_blocked.len(), "Overdue sweep finished");
        newly_blocked
    }

    /// Manually set or clear a user's blocked flag
    pub async fn set_user_blocked(&self, email: &str, blocked: bool) -> AppResult<User> {
        let _user_guard = self.user_locks.lock(&email.to_string()).await;
        self.directory.set_blocked(email, blocked).await?;
        self.directory.find_by_email(email).await
    }

    pub async fn list_active_loans(&self) -> Vec<Loan> {
        self.ledger.active().await
    }

    /// One row per overdue loan
    pub async fn list_overdue(&self) -> Vec<OverdueEntry> {
        let today = self.clock.today();
        self.ledger
            .overdue(today)
            .await
            .iter()
            .map(|loan| OverdueEntry::from_loan(loan, today))
            .collect()
    }

    pub async fn list_loans_for(&self, email: &str) -> AppResult<Vec<Loan>> {
        self.directory.find_by_email(email).await?;
        Ok(self.ledger.loans_for(email).await)
    }

    /// Save catalog and ledger. Failures are logged; memory stays authoritative
    /// until the next successful save.
    ///
    /// Snapshots are taken after acquiring the save lock, so the last save to
    /// finish always carries every mutation made before it started.
    async fn persist_lending_state(&self) {
        let _persist_guard = self.persist_lock.lock().await;
        let works = self.catalog.list().await;
        if let Err(e) = self.repository.save_catalog(&works).await {
            tracing::error!(error = %e, "Failed to save catalog");
        }
        let loans = self.ledger.snapshot().await;
        if let Err(e) = self.repository.save_loans(&loans).await {
            tracing::error!(error = %e, "Failed to save loan ledger");
        }
    }
}

fn deny(user: &User, work_id: i32, reason: DenialReason) -> AppError {
    tracing::warn!(email = %user.email, work_id, %reason, "Loan denied");
    AppError::Denied(reason)
}
