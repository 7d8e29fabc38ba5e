use chrono::{Duration, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;

use super::password::verify_password;
use super::{generate_jwt, verify_jwt, AuthError, Claims};

/// The single configured admin account
#[derive(Debug, Clone)]
pub struct AdminCredential {
    pub username: String,
    /// PHC string, see [`super::password::hash_password`]
    pub password_hash: String,
}

/// OAuth2-style token response returned by the login route
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Checks login attempts against the admin credential and signs session
/// tokens; also verifies them on the way back in.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    credential: AdminCredential,
    secret: String,
    token_ttl: Duration,
}

impl CredentialVerifier {
    pub fn new(credential: AdminCredential, secret: impl Into<String>, token_ttl: Duration) -> Self {
        Self {
            credential,
            secret: secret.into(),
            token_ttl,
        }
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        // Both checks always run; the username is compared exactly, in constant time
        let password_ok = verify_password(password, &self.credential.password_hash);
        let username_ok: bool = username.as_bytes().ct_eq(self.credential.username.as_bytes()).into();
        if !(username_ok && password_ok) {
            return Err(AuthError::InvalidCredentials);
        }

        let claims = Claims::new(username, Utc::now(), self.token_ttl)?;
        let access_token = generate_jwt(&claims, &self.secret)?;

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.token_ttl.num_seconds(),
        })
    }

    /// Validate a bearer token and return its claims.
    ///
    /// Besides signature and expiry, the subject has to name the configured
    /// admin, so renaming the admin account also retires its old tokens.
    pub fn authorize(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = verify_jwt(token, &self.secret)?;
        if claims.sub != self.credential.username {
            return Err(AuthError::InvalidToken(format!("unknown subject '{}'", claims.sub)));
        }
        Ok(claims)
    }
}
