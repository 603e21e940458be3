// ============================================================================
// Anti-Forgery Token Module
// ============================================================================
//
// Action-scoped tokens proving that a request originated from a page the
// server itself rendered.
//
// Token Format: base64(timestamp:action:hmac_signature)
// - timestamp: Unix timestamp for TTL validation
// - action: fixed action identifier the token is bound to
// - hmac_signature: HMAC-SHA256(timestamp:action, secret)
//
// ============================================================================

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::XsrfConfig;
use crate::context::XsrfTokenManager;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-based anti-forgery token manager
pub struct HmacXsrfManager {
    secret: String,
    token_ttl_secs: u64,
}

impl HmacXsrfManager {
    pub fn new(config: &XsrfConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    fn signature(&self, timestamp: u64, action: &str) -> String {
        let message = format!("{}:{}", timestamp, action);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn encode(&self, timestamp: u64, action: &str) -> String {
        let token_data = format!("{}:{}:{}", timestamp, action, self.signature(timestamp, action));
        BASE64.encode(token_data.as_bytes())
    }

    /// Validate a token against the expected action name
    ///
    /// Checks:
    /// 1. Token format is valid
    /// 2. Timestamp is within TTL
    /// 3. Action name matches
    /// 4. HMAC signature is valid
    fn validate(&self, token: &str, expected_action: &str) -> Result<(), String> {
        let token_bytes = BASE64.decode(token).map_err(|_| "Invalid token encoding")?;
        let token_str = String::from_utf8(token_bytes).map_err(|_| "Invalid token encoding")?;

        // Parse token parts: timestamp:action:signature
        let parts: Vec<&str> = token_str.split(':').collect();
        if parts.len() != 3 {
            return Err("Invalid token format".to_string());
        }

        let timestamp: u64 = parts[0].parse().map_err(|_| "Invalid timestamp")?;
        let action = parts[1];
        let signature_hex = parts[2];

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        if now.saturating_sub(timestamp) > self.token_ttl_secs {
            return Err("Token expired".to_string());
        }

        if action != expected_action {
            return Err("Token action mismatch".to_string());
        }

        // Constant-time comparison to prevent timing attacks
        use subtle::ConstantTimeEq;
        let expected_hex = self.signature(timestamp, action);
        if !bool::from(signature_hex.as_bytes().ct_eq(expected_hex.as_bytes())) {
            return Err("Invalid token signature".to_string());
        }

        Ok(())
    }
}

impl XsrfTokenManager for HmacXsrfManager {
    fn create_token(&self, action: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.encode(timestamp, action)
    }

    fn is_token_valid(&self, token: &str, action: &str) -> bool {
        self.validate(token, action).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XSRF_ACTION_NAME;

    fn manager() -> HmacXsrfManager {
        HmacXsrfManager::new(&XsrfConfig {
            secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
        })
    }

    #[test]
    fn fresh_token_validates_for_its_action() {
        let manager = manager();
        let token = manager.create_token(XSRF_ACTION_NAME);
        assert!(manager.is_token_valid(&token, XSRF_ACTION_NAME));
    }

    #[test]
    fn token_for_other_action_is_rejected() {
        let manager = manager();
        let token = manager.create_token("launch-job");
        assert!(!manager.is_token_valid(&token, XSRF_ACTION_NAME));
    }

    #[test]
    fn expired_token_is_rejected() {
        let manager = manager();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let stale = manager.encode(now - 7200, XSRF_ACTION_NAME);
        assert!(!manager.is_token_valid(&stale, XSRF_ACTION_NAME));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let manager = manager();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let forged = BASE64.encode(
            format!("{}:{}:{}", now, XSRF_ACTION_NAME, "00".repeat(32)).as_bytes(),
        );
        assert!(!manager.is_token_valid(&forged, XSRF_ACTION_NAME));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let manager = manager();
        assert!(!manager.is_token_valid("tok123", XSRF_ACTION_NAME));
        assert!(!manager.is_token_valid("", XSRF_ACTION_NAME));
    }

    #[test]
    fn secret_mismatch_is_rejected() {
        let minted_by = manager();
        let checked_by = HmacXsrfManager::new(&XsrfConfig {
            secret: "other-secret".to_string(),
            token_ttl_secs: 3600,
        });
        let token = minted_by.create_token(XSRF_ACTION_NAME);
        assert!(!checked_by.is_token_valid(&token, XSRF_ACTION_NAME));
    }
}
