use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password;
use crate::auth::permissions::Role;
use crate::error::AppError;
use crate::loader::LoadError;
use crate::models::{User, UserView};
use crate::store::{read_collection, write_collection};

const DEFAULT_ACCOUNTS: [(&str, &str, &str, Role); 3] = [
    ("admin", "admin123", "admin@chronominerals.com", Role::Administrator),
    ("investor1", "investor123", "investor@example.com", Role::Investor),
    ("researcher1", "research123", "researcher@example.com", Role::Researcher),
];

/// Accounts backed by `users.json`.
pub struct AccountStore {
    path: PathBuf,
    users: RwLock<Vec<User>>,
}

impl AccountStore {
    /// Load the account file, creating it when absent. With `seed` set, a fresh
    /// file starts with the demo accounts.
    pub async fn open(path: PathBuf, seed: bool) -> Result<Self, LoadError> {
        if let Some(users) = read_collection::<User>(&path).await? {
            tracing::info!("Loaded {} user accounts", users.len());
            return Ok(Self {
                path,
                users: RwLock::new(users),
            });
        }

        let mut users = Vec::new();
        if seed {
            for (username, plain, email, role) in DEFAULT_ACCOUNTS {
                let password_hash =
                    password::hash(plain).map_err(|e| LoadError::Seed(e.to_string()))?;
                users.push(User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash,
                    email: email.to_string(),
                    role,
                    created_at: Utc::now(),
                });
            }
            tracing::warn!(
                "Created {} with demo accounts; change their passwords before exposing this server",
                path.display()
            );
        }

        write_collection(&path, &users)
            .await
            .map_err(|e| LoadError::Seed(e.to_string()))?;

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserView, AppError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
            .ok_or_else(|| AppError::NotFound(format!("No account named {}", username.trim())))?;

        if !password::verify(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(UserView::from(user))
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> Result<UserView, AppError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        }

        // Hash before taking the lock; argon2 is deliberately slow.
        let password_hash = password::hash(password)?;

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username.eq_ignore_ascii_case(username)) {
            return Err(AppError::DuplicateUsername(username.to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        };
        let view = UserView::from(&user);
        users.push(user);

        if let Err(e) = write_collection(&self.path, &users).await {
            users.pop();
            return Err(e);
        }

        tracing::info!("Registered {} as {}", view.username, view.role);
        Ok(view)
    }

    pub async fn list(&self) -> Vec<UserView> {
        self.users.read().await.iter().map(UserView::from).collect()
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}
