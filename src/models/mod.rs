//! Data models for the lending server

pub mod loan;
pub mod user;
pub mod work;

// Re-export commonly used types
pub use loan::{Loan, OverdueEntry, LOAN_PERIOD_DAYS};
pub use user::{limit_for, CreateUser, Role, RoleProfile, User};
pub use work::{Work, UNKNOWN_AUTHOR};
