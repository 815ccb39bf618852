use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Role, User},
    repository::{RepositoryError, RepositoryState},
};

/// RoleDirectory
///
/// Classifies identities by their stored role and owns the small amount of
/// account management the marketplace needs (registration, admin role changes,
/// admin removal). Lookups on an unknown email answer `false`, never an error.
#[derive(Clone)]
pub struct RoleDirectory {
    repo: RepositoryState,
}

impl RoleDirectory {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// The stored role for `email`, or `None` when no such user exists.
    pub async fn role_of(&self, email: &str) -> Result<Option<Role>, AppError> {
        Ok(self
            .repo
            .find_user_by_email(email)
            .await?
            .map(|user| user.role))
    }

    pub async fn has_role(&self, email: &str, role: Role) -> Result<bool, AppError> {
        Ok(self.role_of(email).await? == Some(role))
    }

    pub async fn is_seller(&self, email: &str) -> Result<bool, AppError> {
        self.has_role(email, Role::Seller).await
    }

    pub async fn is_admin(&self, email: &str) -> Result<bool, AppError> {
        self.has_role(email, Role::Admin).await
    }

    pub async fn is_buyer(&self, email: &str) -> Result<bool, AppError> {
        self.has_role(email, Role::Buyer).await
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, AppError> {
        Ok(self.repo.find_users_by_role(role).await?)
    }

    /// register
    ///
    /// Creates the account on first registration. A repeat registration for the
    /// same email returns the stored record untouched, so a second call can
    /// never change the role. `admin` is only reachable through [`RoleDirectory::set_role`].
    pub async fn register(&self, email: &str, role: Role) -> Result<User, AppError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("a valid email is required"));
        }
        if role == Role::Admin {
            return Err(AppError::validation("admin role cannot be self-assigned"));
        }

        if let Some(existing) = self.repo.find_user_by_email(email).await? {
            return Ok(existing);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        };

        match self.repo.insert_user(user).await {
            Ok(created) => {
                tracing::info!(email = %created.email, role = %created.role, "user registered");
                Ok(created)
            }
            // Lost a race against a concurrent registration of the same email.
            Err(RepositoryError::Duplicate(_)) => self
                .repo
                .find_user_by_email(email)
                .await?
                .ok_or_else(|| AppError::not_found("user")),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let user = self
            .repo
            .set_user_role(id, role)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        tracing::info!(user_id = %id, role = %role, "user role changed");
        Ok(user)
    }

    /// Removes a user only when its stored role is `role`. Any other account,
    /// admins included, is `NotFound` from this path.
    pub async fn remove_user(&self, id: Uuid, role: Role) -> Result<(), AppError> {
        match self.repo.find_user(id).await? {
            Some(user) if user.role == role => {}
            _ => return Err(AppError::not_found(role.as_str())),
        }

        if self.repo.delete_user(id).await? {
            tracing::info!(user_id = %id, %role, "user removed");
            Ok(())
        } else {
            Err(AppError::not_found(role.as_str()))
        }
    }
}
