//! Loan ledger snapshot: a JSON array of loan records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Loan,
};

/// On-disk shape of a loan
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoanRecord {
    email: String,
    work_id: i32,
    checkout_date: NaiveDate,
    due_date: NaiveDate,
    returned: bool,
}

impl From<&Loan> for LoanRecord {
    fn from(loan: &Loan) -> Self {
        Self {
            email: loan.email.clone(),
            work_id: loan.work_id,
            checkout_date: loan.checkout_date,
            due_date: loan.due_date,
            returned: loan.returned,
        }
    }
}

impl From<LoanRecord> for Loan {
    fn from(record: LoanRecord) -> Self {
        Self {
            email: record.email,
            work_id: record.work_id,
            checkout_date: record.checkout_date,
            due_date: record.due_date,
            returned: record.returned,
        }
    }
}

pub fn parse(content: &str, file: &str) -> AppResult<Vec<Loan>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<serde_json::Value> = serde_json::from_str(content)
        .map_err(|e| AppError::corrupt(file, e.line(), format!("not a JSON array of loans: {}", e)))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record = index + 1;
            let loan: LoanRecord = serde_json::from_value(value)
                .map_err(|e| AppError::corrupt(file, record, e.to_string()))?;
            if loan.email.trim().is_empty() {
                return Err(AppError::corrupt(file, record, "empty email"));
            }
            if loan.due_date < loan.checkout_date {
                return Err(AppError::corrupt(file, record, "due date precedes checkout date"));
            }
            Ok(loan.into())
        })
        .collect()
}

pub fn format(loans: &[Loan]) -> AppResult<String> {
    let records: Vec<LoanRecord> = loans.iter().map(LoanRecord::from).collect();
    serde_json::to_string_pretty(&records)
        .map_err(|e| AppError::Internal(format!("Failed to serialize loans: {}", e)))
}
