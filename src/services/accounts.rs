//! Login and registration.

use std::collections::HashMap;

use super::LibraryService;
use crate::auth::{hash_password, verify_password, UNMATCHABLE_HASH};
use crate::errors::AppError;
use crate::models::{LoginResponse, NewUser, PublicUser, User};
use crate::validation::{validate, Candidate};

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid email or password".to_string())
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already exists".to_string())
}

impl LibraryService {
    /// Exchange credentials for an identity token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .stores
            .users
            .with_records(|mut users| users.find(|u| u.email == email).cloned())
            .await;

        // Unknown emails still pay for one verification.
        let password = password.to_string();
        let hash = user
            .as_ref()
            .map_or_else(|| UNMATCHABLE_HASH.to_string(), |u| u.password_hash.clone());
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?;

        let user = match user {
            Some(user) if matches => user,
            Some(user) => {
                tracing::info!(user_id = %user.id, "Login rejected: wrong password");
                return Err(invalid_credentials());
            }
            None => {
                tracing::info!("Login rejected for unknown email");
                return Err(invalid_credentials());
            }
        };

        let token = self.tokens.issue(&user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse {
            token,
            role: user.role,
        })
    }

    /// Validate and store a new account. Emails are unique.
    pub async fn register(&self, candidate: &Candidate) -> Result<PublicUser, AppError> {
        let new_user: NewUser = validate(candidate)?;

        // Cheap pre-check so a duplicate does not pay for hashing; the
        // authoritative check runs again under the write lock below.
        let taken = self
            .stores
            .users
            .with_records(|mut users| users.any(|u| u.email == new_user.email))
            .await;
        if taken {
            return Err(email_taken());
        }

        let password = new_user.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let user = User {
            id: String::new(),
            email: new_user.email,
            password_hash,
            password: None,
            role: new_user.role,
        };

        let stored = self
            .stores
            .users
            .insert_checked(user, |candidate, mut existing| {
                if existing.any(|u| u.email == candidate.email) {
                    Err(email_taken())
                } else {
                    Ok(())
                }
            })
            .await?;

        tracing::info!(user_id = %stored.id, role = %stored.role, "User registered");
        Ok(PublicUser::from(&stored))
    }

    /// Replace cleartext passwords left by older data files with hashes.
    /// Returns the number of upgraded accounts.
    pub async fn upgrade_legacy_passwords(&self) -> Result<usize, AppError> {
        let legacy: Vec<(String, String)> = self
            .stores
            .users
            .with_records(|users| {
                users
                    .filter(|u| u.needs_password_upgrade())
                    .filter_map(|u| u.password.clone().map(|password| (u.id.clone(), password)))
                    .collect()
            })
            .await;
        if legacy.is_empty() {
            return Ok(0);
        }

        // Hash outside the store lock; nothing is modified until every hash exists.
        let hashed: HashMap<String, (String, String)> = tokio::task::spawn_blocking(move || {
            legacy
                .into_iter()
                .map(|(id, password)| {
                    let hash = hash_password(&password)?;
                    Ok::<_, AppError>((id, (password, hash)))
                })
                .collect::<Result<HashMap<_, _>, AppError>>()
        })
        .await??;

        let upgraded = self
            .stores
            .users
            .modify_all(|users| {
                let mut upgraded = 0;
                for user in users.filter(|u| u.needs_password_upgrade()) {
                    let Some((password, hash)) = hashed.get(&user.id) else {
                        continue;
                    };
                    if user.password.as_deref() == Some(password.as_str()) {
                        user.password_hash = hash.clone();
                        user.password = None;
                        upgraded += 1;
                    }
                }
                Ok(upgraded)
            })
            .await?;

        if upgraded > 0 {
            tracing::warn!("Upgraded {} cleartext passwords to hashes", upgraded);
        }
        Ok(upgraded)
    }
}
