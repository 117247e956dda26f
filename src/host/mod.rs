//! The local host.
//!
//! `slipway serve` binds one loopback port that plays both viewer-facing
//! tiers: the distribution serves bucket objects under `/`, and the API
//! answers under `/api`. Handlers run through the same access grants and
//! viewer policy the deployed stack declares, so what the browser sees
//! locally is what the declarations say.
//!
//! The host trusts an `x-forwarded-proto` header to learn the viewer's
//! scheme; a request without one is treated as already secure, so plain
//! loopback traffic is not bounced to HTTPS.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, HOST, LOCATION};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use axum::Router;

use crate::core::manifest::{ApiSection, Manifest};
use crate::core::resource::ResourceSpec;
use crate::core::stack::{Stack, SITE_BUCKET, SITE_DISTRIBUTION};
use crate::delivery::{MissBehavior, ViewerPolicy};
use crate::handlers;
use crate::store::{DirObjectStore, FileNoteStore, NoteStore, ObjectStore, ReadGrant, WriteGrant};
use crate::util::context::StateLayout;
use crate::util::shell::{Shell, Status};
use crate::util::InternedString;

/// Everything a request needs, shared across the router.
#[derive(Clone)]
pub struct HostState {
    reader: ReadGrant,
    writer: WriteGrant,
    site: Arc<DirObjectStore>,
    policy: Arc<ViewerPolicy>,
    cors: Arc<CorsPolicy>,
}

impl HostState {
    /// Assemble host state from the declared stack and the materialized
    /// project layout.
    pub fn from_project(manifest: &Manifest, layout: &StateLayout) -> Result<HostState> {
        let stack = Stack::synthesize(manifest)?;

        let bucket = match stack.get(InternedString::new(SITE_BUCKET)).map(|r| &r.spec) {
            Some(ResourceSpec::Bucket(spec)) => spec,
            _ => bail!("stack `{}` declares no site bucket", stack.name()),
        };
        let distribution = match stack
            .get(InternedString::new(SITE_DISTRIBUTION))
            .map(|r| &r.spec)
        {
            Some(ResourceSpec::Distribution(spec)) => spec,
            _ => bail!("stack `{}` declares no distribution", stack.name()),
        };

        let site = DirObjectStore::open(&bucket.name, layout.bucket_dir(&bucket.name))?;
        let notes: Arc<dyn NoteStore> =
            Arc::new(FileNoteStore::open(layout.table_path(&manifest.table.name)));

        Ok(HostState {
            reader: ReadGrant::new(notes.clone()),
            writer: WriteGrant::new(notes),
            site: Arc::new(site),
            policy: Arc::new(ViewerPolicy::from_spec(distribution)),
            cors: Arc::new(CorsPolicy::from_manifest(&manifest.api)),
        })
    }
}

/// CORS response headers, precomputed from the API declaration.
#[derive(Debug)]
struct CorsPolicy {
    origins: String,
    methods: String,
    headers: String,
}

impl CorsPolicy {
    fn from_manifest(api: &ApiSection) -> Self {
        CorsPolicy {
            origins: api.cors_origins.join(","),
            methods: api.cors_methods.join(","),
            headers: api.cors_headers.join(","),
        }
    }

    fn apply(&self, response: &mut axum::response::Response) {
        let pairs = [
            ("access-control-allow-origin", &self.origins),
            ("access-control-allow-methods", &self.methods),
            ("access-control-allow-headers", &self.headers),
        ];
        for (name, value) in pairs {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name),
                HeaderValue::try_from(value.as_str()),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
    }
}

/// Build the router: API under `/api`, the site everywhere else.
pub fn build_router(state: HostState) -> Router {
    let api = Router::new()
        .route(
            "/notes",
            get(list_notes).post(create_note).options(preflight),
        )
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .fallback(site)
        .with_state(state)
}

/// Bind the host and serve until interrupted.
pub fn run_blocking(state: HostState, port: u16, shell: &Shell) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the host runtime")?;

    runtime.block_on(async {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        shell.status(
            Status::Serving,
            format!("site on http://{addr}/ and api on http://{addr}/api"),
        );
        shell.note("press Ctrl-C to stop");

        axum::serve(listener, build_router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("host server failed")?;

        Ok(())
    })
}

/// Convert a handler response, stamping the CORS headers on it.
fn into_http(response: handlers::Response, cors: &CorsPolicy) -> axum::response::Response {
    let mut http = axum::response::Response::new(Body::from(response.body));
    *http.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            http.headers_mut().insert(name, value);
        }
    }
    cors.apply(&mut http);
    http
}

async fn list_notes(State(state): State<HostState>) -> axum::response::Response {
    let response = handlers::read::handle(&state.reader);
    into_http(response, &state.cors)
}

async fn create_note(State(state): State<HostState>, body: Bytes) -> axum::response::Response {
    let response = handlers::write::handle(&body, &state.writer);
    into_http(response, &state.cors)
}

async fn preflight(State(state): State<HostState>) -> axum::response::Response {
    let mut response = axum::response::Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    state.cors.apply(&mut response);
    response
}

async fn api_not_found(State(state): State<HostState>) -> axum::response::Response {
    let response = handlers::Response::json(404, r#"{"message":"Not Found"}"#.into());
    into_http(response, &state.cors)
}

/// Serve a bucket object the way the distribution would.
async fn site(State(state): State<HostState>, request: Request) -> axum::response::Response {
    let method = request.method();
    if method != "GET" && method != "HEAD" {
        let mut response = axum::response::Response::new(Body::empty());
        *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        if let Ok(value) = HeaderValue::try_from("GET, HEAD") {
            response.headers_mut().insert("allow", value);
        }
        return response;
    }

    let path = request.uri().path().to_string();
    let headers = request.headers();

    // A forwarded plain-HTTP viewer gets bounced to HTTPS, like the
    // distribution's viewer protocol policy does.
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let authority = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("127.0.0.1");
    if let Some(target) = state.policy.upgrade_target(scheme, authority, &path) {
        let mut response = axum::response::Response::new(Body::empty());
        *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
        if let Ok(value) = HeaderValue::try_from(target) {
            response.headers_mut().insert(LOCATION, value);
        }
        return response;
    }

    let key = state.policy.resolve_key(&path);
    match serve_key(&state, &key, 200) {
        Ok(Some(response)) => response,
        Ok(None) => match state.policy.on_miss() {
            MissBehavior::ServeKey { key, status } => {
                match serve_key(&state, &key, status) {
                    Ok(Some(response)) => response,
                    Ok(None) => plain(StatusCode::NOT_FOUND, "Not Found"),
                    Err(_) => plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
                }
            }
            MissBehavior::NotFound => plain(StatusCode::NOT_FOUND, "Not Found"),
        },
        Err(_) => plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    }
}

/// Load one object and its recorded headers. `Ok(None)` means the key
/// has no object.
fn serve_key(
    state: &HostState,
    key: &str,
    status: u16,
) -> Result<Option<axum::response::Response>> {
    let Some(body) = state.site.get(key)? else {
        return Ok(None);
    };
    let meta = state.site.metadata(key)?.unwrap_or_default();

    let mut response = axum::response::Response::new(Body::from(body));
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let content_type = meta
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    if let Ok(value) = HeaderValue::try_from(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    if let Some(cache_control) = &meta.cache_control {
        if let Ok(value) = HeaderValue::try_from(cache_control.as_str()) {
            response.headers_mut().insert(CACHE_CONTROL, value);
        }
    }
    Ok(Some(response))
}

fn plain(status: StatusCode, body: &'static str) -> axum::response::Response {
    let mut response = axum::response::Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::try_from("text/plain; charset=utf-8") {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
