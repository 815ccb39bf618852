use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, token::TokenService};

/// AuthUser
///
/// The verified identity of a request: the email bound to a valid access token.
/// Roles are not carried here; `AccessPolicy` resolves them per check so a role
/// change takes effect on the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
}

/// AuthUser Extractor Implementation
///
/// 1. Reuse the identity already attached by [`require_identity`], if any.
/// 2. Read `Authorization`. Absent -> 401 `Unauthenticated`.
/// 3. Require the `Bearer ` scheme and verify the token. Any failure from here
///    on is 403 `Forbidden`: a credential was presented, it just is not good.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthenticated)?;

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::forbidden("malformed authorization header"))?;

        let tokens = TokenService::from_ref(state);
        let email = tokens.verify(token).map_err(|e| {
            tracing::debug!("token rejected: {}", e);
            AppError::from(e)
        })?;

        Ok(AuthUser { email })
    }
}

/// require_identity
///
/// Route layer for every identity-scoped route. Rejects before the handler runs
/// and stores the verified identity in the request extensions for downstream
/// extractors.
pub async fn require_identity(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(email = %auth_user.email, "identity verified");
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}
