// ============================================================================
// Route Classifier
// ============================================================================
//
// The wrapped job-processing library declares its routes with a generic
// `.*` wildcard prefix and is casual about mixing UI support in with its
// functional paths. Classification separates the two populations and gives
// them distinct public prefixes, so that network-level access rules on the
// worker prefix can stay clean.
//
// Classification is pure and runs once at startup. Every retained pattern
// maps to exactly one descriptor; a pattern the gateway cannot express is
// a fatal configuration error.
//
// ============================================================================

use crate::config::{UI_PREFIX, WORKER_PREFIX};
use crate::error::{GatewayError, GatewayResult};

/// Which request population a route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Machine-to-machine callback, reachable only by the task dispatcher.
    Worker,
    /// Human-facing monitoring page.
    UiPage,
    /// Stylesheet or script under the UI prefix.
    UiAsset,
}

/// Trailing-wildcard shape of a declared pattern, preserved so the route
/// table can register the matching path variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixMatch {
    /// Pattern named a single concrete path.
    Exact,
    /// Pattern ended in `.*` / `(.*)`: the bare path and any sub-path match.
    Optional,
    /// Pattern ended in `(/.+)`: only sub-paths match.
    Required,
}

/// Immutable classification result for one declared route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Public path, rewritten into the gateway's namespace.
    pub path: String,
    pub suffix: SuffixMatch,
    pub class: RouteClass,
}

/// Classify one declared pattern.
///
/// Returns `Ok(None)` for the configuration-listing route, which is dropped
/// on purpose: it needs a companion config file we do not distribute, and
/// exposing it without that file would surface a broken affordance on the
/// front page. Not having it also keeps people from relaunching jobs there.
pub fn classify(pattern: &str) -> GatewayResult<Option<RouteDescriptor>> {
    let rewritten = if let Some(rest) = pattern.strip_prefix(".*/pipeline") {
        // The pipeline sub-namespace mixes RPC/resource endpoints (UI) with
        // its own internal callbacks (worker).
        if pattern.contains("pipeline/rpc/") || pattern == ".*/pipeline(/.+)" {
            format!("{UI_PREFIX}/pipeline{rest}")
        } else {
            format!("{WORKER_PREFIX}/pipeline{rest}")
        }
    } else if let Some(rest) = pattern.strip_prefix(".*") {
        if pattern.contains("/list_configs") {
            return Ok(None);
        }
        if pattern.contains("_callback") {
            format!("{WORKER_PREFIX}{rest}")
        } else {
            format!("{UI_PREFIX}{rest}")
        }
    } else {
        return Err(GatewayError::Config(format!(
            "unclassifiable route pattern: {pattern}"
        )));
    };

    let (path, suffix) = split_wildcard(&rewritten)?;
    let class = if path.contains("/ui/") || path.ends_with("/ui") {
        if path.ends_with(".css") || path.ends_with(".js") {
            RouteClass::UiAsset
        } else {
            RouteClass::UiPage
        }
    } else {
        RouteClass::Worker
    };

    Ok(Some(RouteDescriptor {
        path,
        suffix,
        class,
    }))
}

/// Strip a trailing wildcard from a rewritten path and record its shape.
fn split_wildcard(path: &str) -> GatewayResult<(String, SuffixMatch)> {
    let (base, suffix) = if let Some(base) = path.strip_suffix("(/.+)") {
        (base, SuffixMatch::Required)
    } else if let Some(base) = path.strip_suffix("(.*)") {
        (base.trim_end_matches('/'), SuffixMatch::Optional)
    } else if let Some(base) = path.strip_suffix(".*") {
        (base.trim_end_matches('/'), SuffixMatch::Optional)
    } else {
        (path, SuffixMatch::Exact)
    };

    if base.is_empty() || !base.starts_with('/') || base.contains(&['*', '(', ')', '+'][..]) {
        return Err(GatewayError::Config(format!(
            "unsupported wildcard in route pattern: {path}"
        )));
    }

    Ok((base.to_string(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(pattern: &str) -> RouteDescriptor {
        classify(pattern).unwrap().unwrap()
    }

    #[test]
    fn pipeline_rpc_routes_are_ui() {
        let desc = descriptor(".*/pipeline/rpc/tree");
        assert_eq!(desc.path, "/mapreduce/ui/pipeline/rpc/tree");
        assert_eq!(desc.suffix, SuffixMatch::Exact);
        assert_eq!(desc.class, RouteClass::UiPage);
    }

    #[test]
    fn pipeline_resource_route_is_ui_with_required_suffix() {
        let desc = descriptor(".*/pipeline(/.+)");
        assert_eq!(desc.path, "/mapreduce/ui/pipeline");
        assert_eq!(desc.suffix, SuffixMatch::Required);
        assert_eq!(desc.class, RouteClass::UiPage);
    }

    #[test]
    fn other_pipeline_routes_are_worker() {
        let desc = descriptor(".*/pipeline/output");
        assert_eq!(desc.path, "/mapreduce/worker/pipeline/output");
        assert_eq!(desc.class, RouteClass::Worker);
    }

    #[test]
    fn callback_routes_are_worker_with_optional_suffix() {
        let desc = descriptor(".*/worker_callback.*");
        assert_eq!(desc.path, "/mapreduce/worker/worker_callback");
        assert_eq!(desc.suffix, SuffixMatch::Optional);
        assert_eq!(desc.class, RouteClass::Worker);
    }

    #[test]
    fn plain_routes_are_ui_pages() {
        let desc = descriptor(".*/detail");
        assert_eq!(desc.path, "/mapreduce/ui/detail");
        assert_eq!(desc.class, RouteClass::UiPage);
    }

    #[test]
    fn script_routes_are_ui_assets() {
        let desc = descriptor(".*/status.js");
        assert_eq!(desc.path, "/mapreduce/ui/status.js");
        assert_eq!(desc.class, RouteClass::UiAsset);
    }

    #[test]
    fn catch_all_maps_to_ui_root() {
        let desc = descriptor(".*");
        assert_eq!(desc.path, "/mapreduce/ui");
        assert_eq!(desc.suffix, SuffixMatch::Exact);
        assert_eq!(desc.class, RouteClass::UiPage);
    }

    #[test]
    fn list_configs_is_dropped() {
        assert!(classify(".*/list_configs").unwrap().is_none());
    }

    #[test]
    fn pattern_without_wildcard_prefix_is_a_config_error() {
        assert!(matches!(
            classify("/mapreduce/ui/detail"),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn interior_wildcard_is_a_config_error() {
        assert!(matches!(
            classify(".*/static/(.*)/img"),
            Err(GatewayError::Config(_))
        ));
    }
}
