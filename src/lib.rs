// ============================================================================
// Map/Reduce Gateway
// ============================================================================
//
// Request-dispatch authorization gateway for the map/reduce job-processing
// subsystem's HTTP surface. The subsystem declares (pattern, handler)
// pairs; the gateway classifies each route as worker- or UI-facing,
// installs the matching authorization filter, and rewrites a small fixed
// set of response bodies so that the isolation namespace and anti-forgery
// token survive navigation through UI markup the gateway does not own.
//
// ============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod namespace;
pub mod routes;

pub use config::{
    Config, XsrfConfig, TASK_QUEUE_HEADER, UI_PREFIX, WORKER_BASE_PATH, WORKER_PREFIX,
    XSRF_ACTION_NAME,
};
pub use context::{AppContext, IdentityService, NoAdminIdentity, XsrfTokenManager};
pub use error::{GatewayError, GatewayResult};
pub use routes::{boxed_handler, create_router, DeclaredRoute, DynHandler};
