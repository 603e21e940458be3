// ============================================================================
// Response Context Propagator
// ============================================================================
//
// Some places in the wrapped pipeline UI pass the URL's search string along
// to Ajax RPC calls back to the server, which automatically picks up the
// extra namespace and anti-forgery token parameters. Some do not, so the
// gateway patches those bodies here rather than trying to keep up-to-date
// with the library's templates.
//
// Exactly four (path -> substitution) rules exist; every other response
// passes through untouched. Each substitution targets a fixed literal
// anchor that does not recur after the first rewrite, so applying a rule
// to an already-rewritten body leaves it unchanged.
//
// ============================================================================

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;

use crate::config::{UI_PREFIX, WORKER_PREFIX};

/// Script serving the pipeline status page logic.
pub const PIPELINE_STATUS_SCRIPT_PATH: &str = "/mapreduce/ui/pipeline/status.js";
/// RPC endpoint emitting the pipeline tree with embedded detail links.
pub const PIPELINE_RPC_TREE_PATH: &str = "/mapreduce/ui/pipeline/rpc/tree";
/// Job detail page embedding a script reference.
pub const DETAIL_PAGE_PATH: &str = "/mapreduce/ui/detail";
/// Status script embedding a job-parameter data literal.
pub const STATUS_SCRIPT_PATH: &str = "/mapreduce/ui/status.js";

const REWRITTEN_PATHS: [&str; 4] = [
    PIPELINE_STATUS_SCRIPT_PATH,
    PIPELINE_RPC_TREE_PATH,
    DETAIL_PAGE_PATH,
    STATUS_SCRIPT_PATH,
];

/// Apply the rewrite rule matching `path`, if any.
///
/// Runs on the success path of the UI filter, after the wrapped handler has
/// produced its body and before the response reaches the client.
pub async fn propagate_context(
    path: &str,
    namespace: &str,
    xsrf_token: &str,
    response: Response,
) -> Response {
    if !REWRITTEN_PATHS.contains(&path) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::error!(path, error = %err, "failed to buffer response body for rewrite");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Rewrites are textual; a body that is not UTF-8 passes through as-is.
    let text = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    let params = extra_url_params(namespace, xsrf_token);
    let rewritten = match path {
        PIPELINE_STATUS_SCRIPT_PATH => rewrite_pipeline_status_script(&text),
        PIPELINE_RPC_TREE_PATH => rewrite_rpc_tree_links(&text, &params),
        DETAIL_PAGE_PATH => rewrite_detail_script_src(&text, &params),
        STATUS_SCRIPT_PATH => {
            declare_utf8_charset(&mut parts.headers);
            inject_status_context(&text, namespace, xsrf_token)
        }
        _ => text,
    };

    if let Ok(len) = HeaderValue::from_str(&rewritten.len().to_string()) {
        parts.headers.insert(CONTENT_LENGTH, len);
    }
    Response::from_parts(parts, Body::from(rewritten))
}

/// Pipeline status script: splice the caller's current search string into
/// the embedded relative RPC link, so the browser's next request carries
/// namespace and token along.
fn rewrite_pipeline_status_script(body: &str) -> String {
    body.replace("rpc/tree?", "rpc/tree' + window.location.search + '&")
}

/// Pipeline tree RPC: the emitted detail links point at the worker prefix,
/// which a browser is never allowed to reach. Point them at the UI detail
/// page and carry the session parameters explicitly.
fn rewrite_rpc_tree_links(body: &str, params: &str) -> String {
    body.replace(
        &format!("{WORKER_PREFIX}/detail?"),
        &format!("{UI_PREFIX}/detail?{params}&"),
    )
}

/// Detail page: the embedded script reference carries no parameters of its
/// own, so append the session parameters as its query string.
fn rewrite_detail_script_src(body: &str, params: &str) -> String {
    body.replace("src=\"status.js\"", &format!("src=\"status.js?{params}\""))
}

/// Status script: inject namespace and token entries immediately before the
/// job-id key in the embedded data literal. The anchor recurs after the
/// rewrite, so an already-injected body is left alone.
fn inject_status_context(body: &str, namespace: &str, xsrf_token: &str) -> String {
    if body.contains("'xsrf_token':") {
        return body.to_string();
    }
    let replacement = format!(
        "'namespace': '{}', 'xsrf_token': '{}', 'mapreduce_id':",
        js_escape(namespace),
        js_escape(xsrf_token)
    );
    body.replace("'mapreduce_id':", &replacement)
}

/// Urlencode the non-empty subset of the session parameters.
fn extra_url_params(namespace: &str, xsrf_token: &str) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if !namespace.is_empty() {
        params.append_pair("namespace", namespace);
    }
    if !xsrf_token.is_empty() {
        params.append_pair("xsrf_token", xsrf_token);
    }
    params.finish()
}

/// Escape a value for inclusion in a single-quoted JS string literal. The
/// upstream library substituted raw values here; that is an injection
/// hazard, not a contract.
fn js_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\x3c"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ch => out.push(ch),
        }
    }
    out
}

fn declare_utf8_charset(headers: &mut axum::http::HeaderMap) {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "application/javascript".to_string());
    let value = HeaderValue::from_str(&format!("{mime}; charset=utf-8"))
        .unwrap_or_else(|_| HeaderValue::from_static("application/javascript; charset=utf-8"));
    headers.insert(CONTENT_TYPE, value);
}
