//! Business logic services

pub mod catalog;
pub mod clock;
pub mod ledger;
pub mod lending;
pub mod locks;
pub mod sweeper;
pub mod users;

use std::sync::Arc;

use crate::{error::AppResult, repository::PersistenceAdapter};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<catalog::Catalog>,
    pub users: Arc<users::UserDirectory>,
    pub ledger: Arc<ledger::LoanLedger>,
    pub lending: Arc<lending::LendingService>,
}

impl Services {
    /// Load every store from the repository and wire the lending service
    pub async fn load(
        repository: Arc<dyn PersistenceAdapter>,
        clock: Arc<dyn clock::Clock>,
    ) -> AppResult<Self> {
        let catalog = Arc::new(catalog::Catalog::new(repository.load_catalog().await?));
        let ledger = Arc::new(ledger::LoanLedger::new(repository.load_loans().await?));
        let users = Arc::new(users::UserDirectory::new(
            repository.load_users().await?,
            repository.clone(),
        ));

        tracing::info!(
            works = catalog.len().await,
            loans = ledger.len().await,
            users = users.len().await,
            "Stores loaded"
        );

        let lending = Arc::new(lending::LendingService::new(
            catalog.clone(),
            ledger.clone(),
            users.clone(),
            repository,
            clock,
        ));

        Ok(Self {
            catalog,
            users,
            ledger,
            lending,
        })
    }
}
