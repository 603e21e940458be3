// ============================================================================
// Authorization Filters
// ============================================================================
//
// Two disjoint request populations reach the gateway:
// - worker_filter: machine-to-machine callbacks from the task dispatcher
// - ui_filter: human operators browsing the monitoring UI
//
// Each filter wraps the original handler capability and short-circuits with
// a fixed 403 "Forbidden" response when its admission rules are not met.
// request_logging is the shared request/response log layer.
//
// ============================================================================

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{TASK_QUEUE_HEADER, UI_PREFIX, XSRF_ACTION_NAME};
use crate::context::AppContext;
use crate::error::GatewayError;
use crate::namespace;
use crate::routes::propagate;
use crate::routes::DynHandler;

/// Request logging middleware
pub async fn request_logging(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    tracing::debug!(
        method = %method,
        path = %path,
        "Incoming request"
    );

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Worker authorization filter
///
/// The hosting platform strips the task-queue header from any externally
/// originated request, so its presence proves the call came from the task
/// dispatcher. Belt-and-suspenders with the network-level restriction on
/// the worker path prefix.
pub async fn worker_filter(handler: DynHandler, req: Request) -> Response {
    if !req.headers().contains_key(TASK_QUEUE_HEADER) {
        tracing::debug!(path = %req.uri().path(), "worker route denied: task queue header missing");
        return GatewayError::Unauthorized.into_response();
    }

    // Invoke the original handler unmodified, in the ambient namespace.
    handler(req).await
}

/// UI authorization filter
///
/// Admission requires the UI access toggle to be on, and one of: the path
/// is a public static asset, the submitted anti-forgery token validates
/// against the fixed UI action, or the caller is a platform-recognized
/// administrator. Admitted handlers run with the caller's isolation
/// namespace scoped to the nested call; the response then passes through
/// the context propagator before it is sent.
pub async fn ui_filter(ctx: Arc<AppContext>, handler: DynHandler, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let params = query_params(req.uri().query());
    let xsrf_token = params.get("xsrf_token").cloned().unwrap_or_default();

    let ui_enabled = ctx.config.ui_access_enabled();
    let content_is_static = is_static_asset(&path);
    let token_is_valid =
        !xsrf_token.is_empty() && ctx.xsrf.is_token_valid(&xsrf_token, XSRF_ACTION_NAME);
    let caller_is_admin = ctx.identity.is_admin(req.headers());

    if !(ui_enabled && (content_is_static || token_is_valid || caller_is_admin)) {
        tracing::debug!(path = %path, ui_enabled, "ui route denied");
        return GatewayError::Unauthorized.into_response();
    }

    let ns = params.get("namespace").cloned().unwrap_or_default();
    let response = namespace::with_namespace(ns.clone(), handler(req)).await;

    propagate::propagate_context(&path, &ns, &xsrf_token, response).await
}

/// Stylesheets and scripts under the UI prefix carry no sensitive data and
/// stay publicly reachable once the feature is enabled.
fn is_static_asset(path: &str) -> bool {
    let under_ui_prefix = path
        .strip_prefix(UI_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'));
    under_ui_prefix && (path.ends_with(".css") || path.ends_with(".js"))
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_assets_match_prefix_and_extension() {
        assert!(is_static_asset("/mapreduce/ui/base.css"));
        assert!(is_static_asset("/mapreduce/ui/pipeline/status.js"));
        assert!(!is_static_asset("/mapreduce/ui/detail"));
        assert!(!is_static_asset("/mapreduce/ui"));
        assert!(!is_static_asset("/mapreduce/worker/status.js"));
        assert!(!is_static_asset("/mapreduce/uistatic/base.css"));
    }

    #[test]
    fn query_params_are_decoded() {
        let params = query_params(Some("namespace=course%201&xsrf_token=tok123"));
        assert_eq!(params.get("namespace").unwrap(), "course 1");
        assert_eq!(params.get("xsrf_token").unwrap(), "tok123");
        assert!(query_params(None).is_empty());
    }
}
