use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::AppError, repository::Repository};

/// Lifetime of every issued access token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Claims
///
/// Payload signed into every access token. The email is the only identity claim;
/// possession of a signature-valid, unexpired token proves the holder's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: usize,
    /// Expiration Time (exp), always `iat + 24h`.
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// IssuedToken
///
/// A freshly signed token together with its validity window.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TokenService
///
/// Signs and verifies HS256 access tokens with the server secret. There is no
/// revocation list: a signature-valid token is trusted until `exp`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // A token is dead at exp, not a minute later.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs a token for `email` valid for 24 hours from now.
    ///
    /// This does not check that the user exists; use [`TokenService::issue_for_user`]
    /// on request paths.
    pub fn issue(&self, email: &str) -> Result<IssuedToken, TokenError> {
        self.issue_at(email, Utc::now())
    }

    pub fn issue_at(&self, email: &str, issued_at: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = issued_at + Duration::hours(TOKEN_TTL_HOURS);
        let claims = Claims {
            email: email.to_string(),
            iat: issued_at.timestamp().max(0) as usize,
            exp: expires_at.timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Issues a token only when a user record for `email` already exists.
    pub async fn issue_for_user(
        &self,
        repo: &dyn Repository,
        email: &str,
    ) -> Result<IssuedToken, AppError> {
        if repo.find_user_by_email(email).await?.is_none() {
            tracing::debug!(%email, "token refused for unknown user");
            return Err(AppError::not_found("user"));
        }

        Ok(self.issue(email)?)
    }

    /// Returns the email bound to a signature-valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims.email),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}
