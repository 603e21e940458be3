// ============================================================================
// Gateway Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: registration driver and route table assembly
// - classify.rs: declared-pattern classification into the public namespace
// - middleware.rs: worker/UI authorization filters, request logging
// - xsrf.rs: anti-forgery token generation and validation
// - propagate.rs: response context propagation rules
//
// ============================================================================

pub mod classify;
pub mod middleware;
pub mod propagate;
pub mod xsrf;

use axum::{
    extract::Request,
    response::Response,
    routing::{any, MethodRouter},
    Router,
};
use futures_util::future::BoxFuture;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::error::{GatewayError, GatewayResult};
use classify::{classify, RouteClass, RouteDescriptor, SuffixMatch};

/// Boxed future returned by a wrapped handler capability.
pub type HandlerFuture = BoxFuture<'static, Response>;

/// Handler capability supplied by the wrapped job-processing subsystem.
/// Stored once at registration and invoked directly by the filters.
pub type DynHandler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// One route as declared by the wrapped subsystem, before classification.
pub struct DeclaredRoute {
    pub pattern: String,
    pub handler: DynHandler,
}

impl DeclaredRoute {
    pub fn new(pattern: impl Into<String>, handler: DynHandler) -> Self {
        Self {
            pattern: pattern.into(),
            handler,
        }
    }
}

/// Box an async handler function into a [`DynHandler`].
pub fn boxed_handler<F, Fut>(f: F) -> DynHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| Box::pin(f(req)))
}

/// Assemble the gateway route table from the wrapped subsystem's declared
/// routes.
///
/// Classification runs once, here; an unclassifiable pattern or a duplicate
/// public path aborts assembly. The configuration-listing route is dropped
/// by the classifier and never appears in the table. The wrapped engine
/// must be pointed at [`crate::config::WORKER_BASE_PATH`] for its internal
/// callbacks once this returns.
pub fn create_router(
    ctx: Arc<AppContext>,
    declared: Vec<DeclaredRoute>,
) -> GatewayResult<Router> {
    let mut router = Router::new();
    let mut seen = HashSet::new();

    for route in declared {
        let Some(descriptor) = classify(&route.pattern)? else {
            tracing::info!(pattern = %route.pattern, "route dropped at registration");
            continue;
        };

        for path in registration_paths(&descriptor) {
            if !seen.insert(path.clone()) {
                return Err(GatewayError::Config(format!(
                    "duplicate route path: {path}"
                )));
            }
            router = router.route(
                &path,
                filtered(ctx.clone(), route.handler.clone(), descriptor.class),
            );
        }

        tracing::info!(
            pattern = %route.pattern,
            path = %descriptor.path,
            class = ?descriptor.class,
            "route registered"
        );
    }

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(middleware::request_logging))
            .into_inner(),
    ))
}

/// Concrete paths to register for one descriptor.
fn registration_paths(descriptor: &RouteDescriptor) -> Vec<String> {
    match descriptor.suffix {
        SuffixMatch::Exact => vec![descriptor.path.clone()],
        SuffixMatch::Required => vec![format!("{}/*rest", descriptor.path)],
        SuffixMatch::Optional => vec![
            descriptor.path.clone(),
            format!("{}/*rest", descriptor.path),
        ],
    }
}

/// Wrap a handler capability with the filter matching its route class.
fn filtered(ctx: Arc<AppContext>, handler: DynHandler, class: RouteClass) -> MethodRouter {
    any(move |req: Request| {
        let ctx = ctx.clone();
        let handler = handler.clone();
        async move {
            match class {
                RouteClass::Worker => middleware::worker_filter(handler, req).await,
                RouteClass::UiPage | RouteClass::UiAsset => {
                    middleware::ui_filter(ctx, handler, req).await
                }
            }
        }
    })
}
