//! Loan model and related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days between checkout and due date
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// One user holding one work over a checkout/due window.
///
/// A loan starts active and flips to returned exactly once. It is never
/// removed from the ledger. Overdue is computed on read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub email: String,
    pub work_id: i32,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
    pub returned: bool,
}

impl Loan {
    /// New active loan due [`LOAN_PERIOD_DAYS`] after `checkout_date`
    pub fn new(email: impl Into<String>, work_id: i32, checkout_date: NaiveDate) -> Self {
        Self {
            email: email.into(),
            work_id,
            checkout_date,
            due_date: checkout_date + Duration::days(LOAN_PERIOD_DAYS),
            returned: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.returned
    }

    /// Active and strictly past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && today > self.due_date
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }

    pub fn matches(&self, email: &str, work_id: i32) -> bool {
        self.email == email && self.work_id == work_id
    }
}

/// Row of the overdue report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OverdueEntry {
    pub email: String,
    pub work_id: i32,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

impl OverdueEntry {
    pub fn from_loan(loan: &Loan, today: NaiveDate) -> Self {
        Self {
            email: loan.email.clone(),
            work_id: loan.work_id,
            due_date: loan.due_date,
            days_overdue: loan.days_overdue(today),
        }
    }
}
