use axum::http::HeaderMap;
use std::sync::Arc;

use crate::config::Config;
use crate::routes::xsrf::HmacXsrfManager;

/// Validates and mints anti-forgery tokens scoped to a named action.
///
/// The hosting platform may substitute its own token scheme; the gateway
/// only requires that a token submitted with a request can be checked
/// against the fixed UI action name.
pub trait XsrfTokenManager: Send + Sync {
    fn create_token(&self, action: &str) -> String;
    fn is_token_valid(&self, token: &str, action: &str) -> bool;
}

/// Administrator-identity check delegated to the hosting platform.
pub trait IdentityService: Send + Sync {
    fn is_admin(&self, headers: &HeaderMap) -> bool;
}

/// Default identity service: recognizes no administrators.
pub struct NoAdminIdentity;

impl IdentityService for NoAdminIdentity {
    fn is_admin(&self, _headers: &HeaderMap) -> bool {
        false
    }
}

/// Application context containing shared dependencies
/// This reduces parameter passing and makes it easier to add new dependencies
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub xsrf: Arc<dyn XsrfTokenManager>,
    pub identity: Arc<dyn IdentityService>,
}

impl AppContext {
    /// Creates a new application context
    pub fn new(
        config: Arc<Config>,
        xsrf: Arc<dyn XsrfTokenManager>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            config,
            xsrf,
            identity,
        }
    }

    /// Context with the built-in HMAC token manager and no admin identities
    pub fn from_config(config: Arc<Config>) -> Self {
        let xsrf = Arc::new(HmacXsrfManager::new(&config.xsrf));
        Self::new(config, xsrf, Arc::new(NoAdminIdentity))
    }
}
