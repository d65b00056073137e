use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use futures::{future::BoxFuture, FutureExt};
use serde::Deserialize;
use yup_oauth2::{
    InstalledFlowAuthenticator, InstalledFlowReturnMethod, ServiceAccountAuthenticator,
};

use crate::Error;

pub const SCOPES: [&str; 1] = ["https://www.googleapis.com/auth/calendar"];

/// How to obtain credentials for the calendar, picked in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthStrategy {
    /// Browser consent on first run, then the refresh token cached on disk.
    Interactive {
        client_secret: PathBuf,
        token_cache: PathBuf,
    },
    ServiceAccount { key: PathBuf },
}

impl Default for AuthStrategy {
    fn default() -> Self {
        Self::ServiceAccount {
            key: PathBuf::from("key.json"),
        }
    }
}

/// Anything that can hand out a valid bearer token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> crate::Result<String>;
}

type TokenFuture = BoxFuture<'static, crate::Result<String>>;

/// A [`TokenSource`] backed by one of the [`AuthStrategy`] flows. Refreshing
/// is left to `yup_oauth2`.
pub struct Authenticator {
    fetch: Box<dyn Fn() -> TokenFuture + Send + Sync>,
    strategy: &'static str,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Wraps a built `yup_oauth2` authenticator without naming its connector type.
macro_rules! token_fetcher {
    ($auth: expr) => {{
        let auth = Arc::new($auth);
        move || -> TokenFuture {
            let auth = Arc::clone(&auth);
            async move {
                let token = auth
                    .token(&SCOPES)
                    .await
                    .map_err(|e| Error::Auth(e.to_string()))?;
                token
                    .token()
                    .map(str::to_owned)
                    .ok_or_else(|| Error::Auth("token response had no access token".into()))
            }
            .boxed()
        }
    }};
}

impl Authenticator {
    pub async fn from_strategy(strategy: &AuthStrategy) -> crate::Result<Self> {
        match strategy {
            AuthStrategy::Interactive {
                client_secret,
                token_cache,
            } => {
                let secret = yup_oauth2::read_application_secret(client_secret)
                    .await
                    .map_err(|e| Error::Auth(format!("reading {}: {e}", client_secret.display())))?;
                let auth = InstalledFlowAuthenticator::builder(
                    secret,
                    InstalledFlowReturnMethod::HTTPRedirect,
                )
                .persist_tokens_to_disk(token_cache)
                .build()
                .await?;
                Ok(Self {
                    fetch: Box::new(token_fetcher!(auth)),
                    strategy: "interactive",
                })
            }
            AuthStrategy::ServiceAccount { key } => {
                let key_data = yup_oauth2::read_service_account_key(key)
                    .await
                    .map_err(|e| Error::Auth(format!("reading {}: {e}", key.display())))?;
                let auth = ServiceAccountAuthenticator::builder(key_data).build().await?;
                Ok(Self {
                    fetch: Box::new(token_fetcher!(auth)),
                    strategy: "service_account",
                })
            }
        }
    }
}

#[async_trait]
impl TokenSource for Authenticator {
    async fn token(&self) -> crate::Result<String> {
        (self.fetch)().await
    }
}
