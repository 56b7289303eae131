// Service principal identity. Read from the environment once, in main, so that
// nothing below main ever touches std::env.

use crate::error::{DeployError, Result};
use std::fmt;

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// Placeholder used when no subscription is configured; every remote call will fail with it
pub const PLACEHOLDER_SUBSCRIPTION_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Raw, unchecked values as found at startup
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CredentialSource {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        CredentialSource {
            tenant_id: lookup(TENANT_ID_VAR),
            client_id: lookup(CLIENT_ID_VAR),
            client_secret: lookup(CLIENT_SECRET_VAR),
        }
    }

    /// Fails on the first missing or empty value, in the order client id, secret, tenant
    pub fn resolve(&self) -> Result<Credentials> {
        fn required(value: &Option<String>, var: &'static str) -> Result<String> {
            // blank means unset, anything else is passed through untouched
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(DeployError::MissingCredential(var)),
            }
        }

        Ok(Credentials {
            client_id: required(&self.client_id, CLIENT_ID_VAR)?,
            client_secret: required(&self.client_secret, CLIENT_SECRET_VAR)?,
            tenant_id: required(&self.tenant_id, TENANT_ID_VAR)?,
        })
    }
}

pub fn subscription_id_from_env() -> String {
    match std::env::var(SUBSCRIPTION_ID_VAR) {
        Ok(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => PLACEHOLDER_SUBSCRIPTION_ID.to_string(),
    }
}

#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

// keep the secret out of any {:?} that ends up on a terminal
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}
