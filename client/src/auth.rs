// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tokio_util::sync::CancellationToken;

use crate::error::DavError;
use crate::pipeline::{
    ExecuteInterceptor, ResponseHandler, ResponseHandlerArgs,
};
use crate::request::DavRequest;

/// HTTP Basic credential with a replaceable secret.
///
/// As an [`ExecuteInterceptor`] it attaches `Authorization` to every
/// attempt. As a [`ResponseHandler`] it retries a 401 exactly when the
/// stored secret has changed since the failed request was sent (a
/// token refresh raced the request); a 401 carrying the current secret
/// is final.
pub struct BasicCredential {
    user: String,
    secret: RwLock<String>,
}

impl std::fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredential")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl BasicCredential {
    /// Creates a credential.
    #[must_use]
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: RwLock::new(secret.into()),
        }
    }

    /// The user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Replaces the secret, e.g. after an out-of-band token refresh.
    pub fn set_secret(&self, secret: impl Into<String>) {
        *self.secret.write().unwrap_or_else(PoisonError::into_inner) = secret.into();
    }

    fn authorization(&self) -> String {
        let secret = self.secret.read().unwrap_or_else(PoisonError::into_inner);
        let raw = format!("{}:{}", self.user, *secret);
        format!("Basic {}", BASE64.encode(raw))
    }
}

impl ExecuteInterceptor for BasicCredential {
    fn intercept<'a>(
        &'a self,
        request: &'a mut DavRequest,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), DavError>> {
        Box::pin(async move {
            let value = HeaderValue::from_str(&self.authorization())
                .map_err(|e| DavError::Config(format!("invalid credential: {e}")))?;
            request.headers.insert(AUTHORIZATION, value);
            Ok(())
        })
    }
}

impl ResponseHandler for BasicCredential {
    fn handle<'a>(&'a self, args: ResponseHandlerArgs<'a>) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            if args.status != StatusCode::UNAUTHORIZED || !args.supports_retry {
                return false;
            }
            let sent = args
                .request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            let refreshed = sent != Some(self.authorization().as_str());
            if refreshed {
                tracing::debug!(user = %self.user, "retrying 401 with refreshed credential");
            }
            refreshed
        })
    }
}

/// In-memory credential store keyed by account name.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: RwLock<HashMap<String, Arc<BasicCredential>>>,
}

impl CredentialStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a credential for an account, replacing any previous one.
    pub fn insert(&self, account: impl Into<String>, credential: Arc<BasicCredential>) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.into(), credential);
    }

    /// Fetches the credential for an account.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotSignedIn`] when no credential is stored.
    pub fn get(&self, account: &str) -> Result<Arc<BasicCredential>, DavError> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(account)
            .cloned()
            .ok_or_else(|| DavError::NotSignedIn(account.to_string()))
    }

    /// Removes the credential for an account.
    pub fn remove(&self, account: &str) {
        self.credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(account);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_encodes_user_and_secret() {
        let credential = BasicCredential::new("ada", "s3cret");
        // base64("ada:s3cret")
        assert_eq!(credential.authorization(), "Basic YWRhOnMzY3JldA==");
    }

    #[test]
    fn secret_replacement_changes_authorization() {
        let credential = BasicCredential::new("ada", "old");
        let before = credential.authorization();
        credential.set_secret("new");
        assert_ne!(credential.authorization(), before);
    }

    #[test]
    fn debug_redacts_the_secret() {
        let credential = BasicCredential::new("ada", "s3cret");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("ada"));
    }

    #[test]
    fn store_round_trip() {
        let store = CredentialStore::new();
        assert!(matches!(
            store.get("ada@example.com"),
            Err(DavError::NotSignedIn(_))
        ));

        store.insert(
            "ada@example.com",
            Arc::new(BasicCredential::new("ada", "s3cret")),
        );
        assert!(store.get("ada@example.com").is_ok());

        store.remove("ada@example.com");
        assert!(store.get("ada@example.com").is_err());
    }
}
