use crate::{
    auth::AuthUser,
    error::AppError,
    models::{CarListing, Role},
    roles::RoleDirectory,
};

/// AccessPolicy
///
/// Every authorization rule in one place. Handlers call these after the
/// identity guard has run; none of them look at the HTTP request.
#[derive(Clone)]
pub struct AccessPolicy {
    roles: RoleDirectory,
}

impl AccessPolicy {
    pub fn new(roles: RoleDirectory) -> Self {
        Self { roles }
    }

    /// Self-match rule: a verified identity may only query its own data.
    pub fn require_self(caller: &AuthUser, requested_email: &str) -> Result<(), AppError> {
        if caller.email == requested_email {
            Ok(())
        } else {
            tracing::warn!(
                caller = %caller.email,
                requested = %requested_email,
                "self-match rejected"
            );
            Err(AppError::forbidden("cannot access another user's data"))
        }
    }

    /// Role rule: resolves the caller's stored role and requires it to be one
    /// of `allowed`. An unknown caller has no role and is rejected.
    pub async fn require_role(&self, caller: &AuthUser, allowed: &[Role]) -> Result<Role, AppError> {
        match self.roles.role_of(&caller.email).await? {
            Some(role) if allowed.contains(&role) => Ok(role),
            found => {
                tracing::warn!(caller = %caller.email, role = ?found, ?allowed, "role check rejected");
                Err(AppError::forbidden("insufficient role"))
            }
        }
    }

    pub async fn require_admin(&self, caller: &AuthUser) -> Result<(), AppError> {
        self.require_role(caller, &[Role::Admin]).await.map(|_| ())
    }

    /// The caller must hold an account, whatever its role.
    pub async fn require_registered(&self, caller: &AuthUser) -> Result<Role, AppError> {
        self.roles
            .role_of(&caller.email)
            .await?
            .ok_or_else(|| AppError::forbidden("caller is not a registered user"))
    }

    /// Listing mutations are open to the advertiser and to admins.
    pub async fn require_owner_or_admin(
        &self,
        caller: &AuthUser,
        listing: &CarListing,
    ) -> Result<(), AppError> {
        if listing.advertiser_email == caller.email {
            return Ok(());
        }
        if self.roles.is_admin(&caller.email).await? {
            return Ok(());
        }
        tracing::warn!(caller = %caller.email, listing_id = %listing.id, "ownership check rejected");
        Err(AppError::forbidden("not the owner of this listing"))
    }
}
