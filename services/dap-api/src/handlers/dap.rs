//! DAP2 protocol handler: `.das`, `.dds` and `.dods` responses.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use dap_protocol::{
    das::escape, headers, render_das, render_dds, DapError, DapResult, DatasetNode, DodsChunks,
    ProjectionSet, DATA_MARKER,
};
use metrics::counter;

use crate::config::DapConfig;
use crate::etag::{compute_etag, matches_if_none_match};
use crate::state::AppState;
use crate::streaming::dods_body;
use crate::transport::RequestContext;

/// The three protocol responses, selected by the object path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Das,
    Dds,
    Dods,
}

impl ResponseKind {
    /// Split `object.zarr.dds` into `(Dds, "object.zarr")`. The object id
    /// must not be empty.
    pub fn from_path(path: &str) -> Option<(ResponseKind, &str)> {
        let (object_id, suffix) = path.rsplit_once('.')?;
        let kind = match suffix {
            "das" => ResponseKind::Das,
            "dds" => ResponseKind::Dds,
            "dods" => ResponseKind::Dods,
            _ => return None,
        };
        (!object_id.is_empty()).then_some((kind, object_id))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Das => "das",
            ResponseKind::Dds => "dds",
            ResponseKind::Dods => "dods",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ResponseKind::Das => headers::DESCRIPTION_DAS,
            ResponseKind::Dds => headers::DESCRIPTION_DDS,
            ResponseKind::Dods => headers::DESCRIPTION_DATA,
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ResponseKind::Das | ResponseKind::Dds => headers::CONTENT_TYPE_TEXT,
            ResponseKind::Dods => headers::CONTENT_TYPE_DATA,
        }
    }
}

const CONTENT_DESCRIPTION: HeaderName = HeaderName::from_static("content-description");
const XDODS_SERVER: HeaderName = HeaderName::from_static("xdods-server");

/// GET {prefix}/*object_path
pub async fn dap_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(object_path): Path<String>,
    uri: Uri,
    request_headers: HeaderMap,
) -> Response {
    let object_path = object_path.trim_start_matches('/');
    let Some((kind, object_id)) = ResponseKind::from_path(object_path) else {
        tracing::debug!("No DAP response kind for {:?}", object_path);
        return StatusCode::NOT_FOUND.into_response();
    };
    counter!("dap_requests_total", "kind" => kind.as_str()).increment(1);

    let etag = compute_etag(&uri, &state.config.build_revision);
    let mut response_headers = protocol_headers(&state.config, &etag);

    if matches_if_none_match(&request_headers, &etag) {
        counter!("dap_not_modified_total").increment(1);
        return (StatusCode::NOT_MODIFIED, response_headers).into_response();
    }

    let ctx = RequestContext::from_headers(&request_headers, &state.config.secure_hostnames);
    let projections = ProjectionSet::from_query(uri.query().unwrap_or_default());

    let object_id = object_id.to_string();
    let work_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        build_response(&work_state, kind, &object_id, &ctx, &projections)
    })
    .await
    .unwrap_or_else(|e| Err(DapError::Internal(format!("request task failed: {}", e))));

    match result {
        Ok(body) => {
            insert(&mut response_headers, CONTENT_DESCRIPTION, kind.description());
            insert(&mut response_headers, header::CONTENT_TYPE, kind.content_type());
            (StatusCode::OK, response_headers, body).into_response()
        }
        Err(err) => error_response(&err, response_headers),
    }
}

/// Resolve, project and render. Runs on the blocking pool.
fn build_response(
    state: &AppState,
    kind: ResponseKind,
    object_id: &str,
    ctx: &RequestContext,
    projections: &ProjectionSet,
) -> DapResult<Body> {
    let (mut dataset, mut diagnostics) = state.resolver.resolve(object_id)?;
    diagnostics.extend(projections.diagnostics());
    for diagnostic in &diagnostics.warnings {
        tracing::debug!("{}: {}", object_id, diagnostic);
    }
    dataset.info.references = ctx.references_url(object_id);

    match kind {
        ResponseKind::Das => Ok(Body::from(render_das(&dataset))),
        ResponseKind::Dds => Ok(Body::from(render_dds(&project(&dataset, projections)?))),
        ResponseKind::Dods => {
            let projected = project(&dataset, projections)?;
            let mut head = render_dds(&projected);
            head.push_str(DATA_MARKER);
            Ok(dods_body(Bytes::from(head), DodsChunks::new(&projected)))
        }
    }
}

fn project(dataset: &DatasetNode, projections: &ProjectionSet) -> DapResult<DatasetNode> {
    dataset.project(&projections.projections)
}

/// Headers every protocol response carries, including errors and 304s.
fn protocol_headers(config: &DapConfig, etag: &str) -> HeaderMap {
    let expiry = config.page_expiry();
    let expires = Utc::now() + chrono::Duration::seconds(expiry.as_secs() as i64);

    let mut map = HeaderMap::new();
    insert(&mut map, XDODS_SERVER, headers::XDODS_SERVER);
    insert(
        &mut map,
        header::EXPIRES,
        &expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
    );
    insert(
        &mut map,
        header::CACHE_CONTROL,
        &format!("max-age={}", expiry.as_secs()),
    );
    insert(&mut map, header::VARY, "X-Auth-Roles");
    insert(&mut map, header::ETAG, etag);
    map
}

fn insert(map: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            map.insert(name, value);
        }
        Err(_) => tracing::warn!("Dropping invalid {} header value {:?}", name, value),
    }
}

/// DAP2 error body:
///
/// ```text
/// Error {
///     code = 404;
///     message = "Dataset not found: a.zarr";
/// };
/// ```
pub fn error_body(err: &DapError) -> String {
    format!(
        "Error {{\n    code = {};\n    message = \"{}\";\n}};\n",
        err.status_code(),
        escape(&err.to_string())
    )
}

fn error_response(err: &DapError, mut response_headers: HeaderMap) -> Response {
    let class = err.class();
    if class == dap_protocol::ErrorClass::Server {
        tracing::error!("DAP request failed: {}", err);
    } else {
        tracing::info!("DAP request rejected: {}", err);
    }
    counter!("dap_errors_total", "class" => class.as_str()).increment(1);

    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    insert(&mut response_headers, CONTENT_DESCRIPTION, headers::DESCRIPTION_ERROR);
    insert(&mut response_headers, header::CONTENT_TYPE, headers::CONTENT_TYPE_TEXT);
    (status, response_headers, error_body(err)).into_response()
}
