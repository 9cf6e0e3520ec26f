//! Request signing

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of the access token keyed by the app secret, sent as
/// `appsecret_proof` so a leaked token alone cannot be replayed.
pub fn appsecret_proof(access_token: &str, app_secret: &str) -> Result<String, ConfigError> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| ConfigError::InvalidAppSecret(e.to_string()))?;
    mac.update(access_token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
