//! Loan ledger: every loan ever made, active or returned

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::Loan,
};

pub struct LoanLedger {
    loans: RwLock<Vec<Loan>>,
}

impl LoanLedger {
    pub fn new(loans: Vec<Loan>) -> Self {
        Self {
            loans: RwLock::new(loans),
        }
    }

    /// Number of unreturned loans held by `email`
    pub async fn active_loans_for(&self, email: &str) -> usize {
        self.loans
            .read()
            .await
            .iter()
            .filter(|l| l.email == email && l.is_active())
            .count()
    }

    pub async fn append(&self, loan: Loan) {
        self.loans.write().await.push(loan);
    }

    /// Flip the first active loan matching `(email, work_id)` to returned
    pub async fn mark_returned(&self, email: &str, work_id: i32) -> AppResult<Loan> {
        let mut loans = self.loans.write().await;
        let loan = loans
            .iter_mut()
            .find(|l| l.is_active() && l.matches(email, work_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No active loan of work {} for {}",
                    work_id, email
                ))
            })?;
        loan.returned = true;
        Ok(loan.clone())
    }

    /// Active loans past their due date as of `today`, recomputed on every call
    pub async fn overdue(&self, today: NaiveDate) -> Vec<Loan> {
        self.loans
            .read()
            .await
            .iter()
            .filter(|l| l.is_overdue(today))
            .cloned()
            .collect()
    }

    pub async fn active(&self) -> Vec<Loan> {
        self.loans
            .read()
            .await
            .iter()
            .filter(|l| l.is_active())
            .cloned()
            .collect()
    }

    /// Full history for one user, oldest first
    pub async fn loans_for(&self, email: &str) -> Vec<Loan> {
        self.loans
            .read()
            .await
            .iter()
            .filter(|l| l.email == email)
            .cloned()
            .collect()
    }

    pub async fn snapshot(&self) -> Vec<Loan> {
        self.loans.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.loans.read().await.len()
    }
}
