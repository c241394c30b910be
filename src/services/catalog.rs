//! Catalog: the lendable works and their available-copy counters

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult, DenialReason},
    models::Work,
};

pub struct Catalog {
    works: RwLock<IndexMap<i32, Work>>,
}

impl Catalog {
    pub fn new(works: Vec<Work>) -> Self {
        Self {
            works: RwLock::new(works.into_iter().map(|w| (w.id, w)).collect()),
        }
    }

    /// All works, in catalog order
    pub async fn list(&self) -> Vec<Work> {
        self.works.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.works.read().await.len()
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Work> {
        self.works
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| work_not_found(id))
    }

    /// First work whose title equals `title`, ignoring case
    pub async fn find_by_title(&self, title: &str) -> AppResult<Work> {
        self.works
            .read()
            .await
            .values()
            .find(|w| w.title_matches(title))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No work titled '{}'", title.trim())))
    }

    /// Take one copy off the shelf.
    ///
    /// Availability is checked under the write lock, so two callers can never
    /// both take the last copy.
    pub async fn checkout(&self, id: i32) -> AppResult<Work> {
        let mut works = self.works.write().await;
        let work = works.get_mut(&id).ok_or_else(|| work_not_found(id))?;
        if !work.take_copy() {
            return Err(AppError::Denied(DenialReason::NoCopiesAvailable));
        }
        Ok(work.clone())
    }

    /// Put one copy back. No ceiling is enforced.
    pub async fn return_copy(&self, id: i32) -> AppResult<Work> {
        let mut works = self.works.write().await;
        let work = works.get_mut(&id).ok_or_else(|| work_not_found(id))?;
        work.put_back_copy();
        Ok(work.clone())
    }
}

fn work_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Work with id {} not found", id))
}
