//! Credential resolution

use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

pub const TOKEN_VAR: &str = "ADS_ACCESS_TOKEN";
pub const SECRET_VAR: &str = "ADS_APP_SECRET";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("No access token found; set {}", .tried.join(" or "))]
    MissingToken { tried: Vec<String> },

    #[error("Invalid profile name '{0}': use letters, digits, '-' or '_'")]
    InvalidProfile(String),
}

/// A resolved token and optional app secret
#[derive(Clone)]
pub struct Credentials {
    pub token: Zeroizing<String>,
    pub app_secret: Option<Zeroizing<String>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Yields credentials for a named profile, or the default profile.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, profile: Option<&str>) -> Result<Credentials, CredentialError>;
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads credentials from environment variables.
///
/// A profile `prod` checks `ADS_PROD_ACCESS_TOKEN` before
/// `ADS_ACCESS_TOKEN`, and likewise for the app secret. Empty values count
/// as unset.
pub struct EnvCredentialResolver {
    lookup: Lookup,
}

impl Default for EnvCredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvCredentialResolver {
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Resolver over an arbitrary variable source.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn first_set(&self, names: &[String]) -> Option<Zeroizing<String>> {
        names
            .iter()
            .filter_map(|name| (self.lookup)(name.as_str()))
            .find(|value| !value.trim().is_empty())
            .map(Zeroizing::new)
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self, profile: Option<&str>) -> Result<Credentials, CredentialError> {
        let (token_vars, secret_vars) = match profile {
            Some(profile) => {
                let prefix = profile_prefix(profile)?;
                (
                    vec![format!("ADS_{prefix}_ACCESS_TOKEN"), TOKEN_VAR.to_string()],
                    vec![format!("ADS_{prefix}_APP_SECRET"), SECRET_VAR.to_string()],
                )
            }
            None => (vec![TOKEN_VAR.to_string()], vec![SECRET_VAR.to_string()]),
        };

        let token = self
            .first_set(&token_vars)
            .ok_or_else(|| CredentialError::MissingToken {
                tried: token_vars.clone(),
            })?;
        Ok(Credentials {
            token,
            app_secret: self.first_set(&secret_vars),
        })
    }
}

fn profile_prefix(profile: &str) -> Result<String, CredentialError> {
    let valid = !profile.is_empty()
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(CredentialError::InvalidProfile(profile.to_string()));
    }
    Ok(profile.to_ascii_uppercase().replace('-', "_"))
}
