//! User directory: registration, lookup, credentials and the blocked flag

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{CreateUser, RoleProfile, User},
    repository::PersistenceAdapter,
};

const ARGON2_PREFIX: &str = "$argon2";

pub struct UserDirectory {
    users: RwLock<IndexMap<String, User>>,
    repository: Arc<dyn PersistenceAdapter>,
    persist_lock: Mutex<()>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>, repository: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.email.clone(), u)).collect()),
            repository,
            persist_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<User> {
        self.users
            .read()
            .await
            .get(email)
            .cloned()
            .ok_or_else(|| user_not_found(email))
    }

    /// Check credentials. `None` covers both unknown email and wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Option<User> {
        let user = self.users.read().await.get(email).cloned()?;
        if verify_password(&user, password) {
            Some(user)
        } else {
            None
        }
    }

    /// Add a new user and persist the directory
    pub async fn register(&self, request: CreateUser) -> AppResult<User> {
        request.validate()?;
        let fields = [request.name.as_str(), request.email.as_str()];
        if fields
            .iter()
            .chain(request.profile.text_fields().iter())
            .any(|f| f.contains(',') || f.contains('\n'))
        {
            return Err(AppError::Validation(
                "Fields other than the password may not contain commas or line breaks".to_string(),
            ));
        }
        if request.password.contains('\n') {
            return Err(AppError::Validation(
                "Password may not contain line breaks".to_string(),
            ));
        }

        let user = User::new(
            request.name.trim(),
            request.email.trim(),
            hash_password(&request.password)?,
            request.profile,
        );

        {
            let mut users = self.users.write().await;
            if users.contains_key(&user.email) {
                return Err(AppError::Conflict(format!(
                    "A user with email {} already exists",
                    user.email
                )));
            }
            users.insert(user.email.clone(), user.clone());
        }

        tracing::info!(email = %user.email, role = %user.role(), "User registered");
        self.persist().await;
        Ok(user)
    }

    /// Set the blocked flag. Returns whether the flag changed; only a change
    /// is persisted.
    pub async fn set_blocked(&self, email: &str, blocked: bool) -> AppResult<bool> {
        let changed = {
            let mut users = self.users.write().await;
            let user = users.get_mut(email).ok_or_else(|| user_not_found(email))?;
            let changed = user.blocked != blocked;
            user.blocked = blocked;
            changed
        };

        if changed {
            tracing::info!(email, blocked, "User blocked flag changed");
            self.persist().await;
        }
        Ok(changed)
    }

    /// Count one processed return against a librarian
    pub async fn record_return_processed(&self, email: &str) -> AppResult<u32> {
        let total = {
            let mut users = self.users.write().await;
            let user = users.get_mut(email).ok_or_else(|| user_not_found(email))?;
            match &mut user.profile {
                RoleProfile::Librarian {
                    total_returns_processed,
                    ..
                } => {
                    *total_returns_processed += 1;
                    *total_returns_processed
                }
                _ => {
                    return Err(AppError::Validation(format!(
                        "{} is not a librarian",
                        email
                    )))
                }
            }
        };

        self.persist().await;
        Ok(total)
    }

    /// Save the directory. Failures are logged; memory stays authoritative.
    async fn persist(&self) {
        let _persist_guard = self.persist_lock.lock().await;
        let snapshot = self.list().await;
        if let Err(e) = self.repository.save_users(&snapshot).await {
            tracing::error!(error = %e, "Failed to save user directory");
        }
    }
}

fn user_not_found(email: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", email))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> bool {
    if user.password.starts_with(ARGON2_PREFIX) {
        return match PasswordHash::new(&user.password) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::error!(email = %user.email, error = %e, "Stored password hash is invalid");
                false
            }
        };
    }

    // Accounts imported from legacy files keep plaintext passwords
    tracing::warn!(email = %user.email, "Plaintext password in user directory");
    user.password == password
}
