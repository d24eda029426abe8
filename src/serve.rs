//! HTTP API for analysis
//!
//! `voicescope serve` → JSON endpoints a front end can upload recordings to
//!
//! ```text
//! Method | Path                        | Body           | Returns
//! -------|-----------------------------|----------------|-----------------------
//! POST   | /api/analyze?filename=x.m4a | raw file bytes | AnalysisReport
//! GET    | /api/formats                |                | advertised extensions
//! GET    | /api/ideal                  |                | ideal profile
//! GET    | /api/health                 |                | decoder status
//! ```
//!
//! Every response is wrapped in `{ ok, data, error, kind }`. Problems with
//! the upload answer 422, problems with the host (decoder missing, timeout)
//! answer 500.

use crate::error::Error;
use crate::formats::SUPPORTED_EXTENSIONS;
use crate::pipeline::Analyzer;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(kind: &'static str, message: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message),
            kind: Some(kind),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Serialize)]
struct Health {
    decoder: String,
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    version: &'static str,
}

/// Status code and JSON body of one API call
#[derive(Debug)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"data":null,"error":"serialization failed: {}"}}"#, e)
        });
        Self { status, body }
    }

    fn error(err: &Error) -> Self {
        let status = if err.is_input_error() { 422 } else { 500 };
        Self::json(status, &ApiResponse::failure(err.kind(), err.to_string()))
    }

    fn not_found() -> Self {
        Self::json(404, &ApiResponse::failure("not_found", "Not found".to_string()))
    }
}

/// Bind and serve until the process exits
pub fn start(port: u16, workers: usize, analyzer: Analyzer) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    tracing::info!(
        "Listening on http://{} with {} worker(s), decoder: {}",
        addr,
        workers.max(1),
        analyzer.decoder().name()
    );

    run(Arc::new(server), workers, Arc::new(analyzer));
    Ok(())
}

/// Handle requests on `workers` threads sharing one server and analyzer
pub fn run(server: Arc<Server>, workers: usize, analyzer: Arc<Analyzer>) {
    let handles: Vec<_> = (0..workers.max(1))
        .map(|id| {
            let server = Arc::clone(&server);
            let analyzer = Arc::clone(&analyzer);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &analyzer) {
                        tracing::error!("worker {}: failed to respond: {}", id, e);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }
}

fn handle_request(mut request: Request, analyzer: &Analyzer) -> std::io::Result<()> {
    let url = request.url().to_string();
    let method = request.method().clone();
    tracing::debug!("{} {}", method, url);

    let reply = match (&method, route(&url)) {
        (&Method::Post, "/api/analyze") => {
            let params = parse_params(&url);
            match read_body(&mut request) {
                Ok(body) => analyze(analyzer, &body, params.filename.as_deref()),
                Err(e) => ApiReply::error(&Error::Io(e)),
            }
        }
        _ => dispatch(analyzer, &method, &url, &[]),
    };

    let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "invalid header"))?;
    let response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(content_type);
    request.respond(response)
}

/// Route a request without any socket involved
pub fn dispatch(analyzer: &Analyzer, method: &Method, url: &str, body: &[u8]) -> ApiReply {
    match (method, route(url)) {
        (&Method::Post, "/api/analyze") => {
            let params = parse_params(url);
            analyze(analyzer, body, params.filename.as_deref())
        }
        (&Method::Get, "/api/formats") => ApiReply::json(200, &ApiResponse::success(SUPPORTED_EXTENSIONS)),
        (&Method::Get, "/api/ideal") => ApiReply::json(200, &ApiResponse::success(analyzer.ideal())),
        (&Method::Get, "/api/health") => {
            let check = analyzer.decoder().check_available();
            let health = Health {
                decoder: analyzer.decoder().name().to_string(),
                available: check.is_ok(),
                detail: check.err().map(|e| e.to_string()),
                version: env!("CARGO_PKG_VERSION"),
            };
            ApiReply::json(200, &ApiResponse::success(health))
        }
        _ => ApiReply::not_found(),
    }
}

fn route(url: &str) -> &str {
    url.split('?').next().unwrap_or("/")
}

fn parse_params(url: &str) -> AnalyzeParams {
    url.split_once('?')
        .and_then(|(_, query)| serde_urlencoded::from_str::<AnalyzeParams>(query).ok())
        .unwrap_or_default()
}

fn read_body(request: &mut Request) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_UPLOAD_BYTES + 1)
        .read_to_end(&mut body)?;
    Ok(body)
}

fn analyze(analyzer: &Analyzer, body: &[u8], filename: Option<&str>) -> ApiReply {
    if body.len() as u64 > MAX_UPLOAD_BYTES {
        return ApiReply::json(
            413,
            &ApiResponse::failure(
                "too_large",
                format!("upload exceeds {} bytes", MAX_UPLOAD_BYTES),
            ),
        );
    }

    let name = filename.unwrap_or("upload");
    tracing::info!("→ {} ({} bytes)", name, body.len());

    match analyzer.analyze_bytes(body, name) {
        Ok(report) => ApiReply::json(200, &ApiResponse::success(report)),
        Err(e) => {
            tracing::warn!("{}: {}", name, e);
            ApiReply::error(&e)
        }
    }
}
