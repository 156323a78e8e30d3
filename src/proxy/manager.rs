// src/proxy/manager.rs
use std::sync::Arc;

use bytes::Bytes;
use log::{debug, error, info, warn};
use percent_encoding::percent_decode_str;
use pingora::{Result, http, prelude::HttpPeer};
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{
    ConfigError, ConfigInput, DocumentStore, ErrorKind, file_manager, notes::NotesStore,
};
use crate::services::containers::{ContainerDiscovery, MINECRAFT_PORT};

/// Request bodies above this size are rejected
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// JSON response produced by the management API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: http::StatusCode,
    pub body: serde_json::Value,
}

impl ApiResponse {
    fn json<T: Serialize>(status: http::StatusCode, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(e) => Self::error(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to serialize response: {}", e),
            ),
        }
    }

    fn error(status: http::StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn success() -> Self {
        Self {
            status: http::StatusCode::OK,
            body: json!({ "success": true }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    domain: String,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostRequest {
    domain: String,
    container_id: String,
    port: Option<u16>,
    #[serde(default)]
    note: String,
}

fn config_error_status(err: &ConfigError) -> http::StatusCode {
    match err.kind() {
        ErrorKind::Validation => http::StatusCode::BAD_REQUEST,
        ErrorKind::Load | ErrorKind::Write => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Percent-decode one path segment into a non-blank domain
fn path_domain(segment: &str) -> std::result::Result<String, ApiResponse> {
    let domain = percent_decode_str(segment).decode_utf8().map_err(|_| {
        ApiResponse::error(http::StatusCode::BAD_REQUEST, "Invalid path encoding")
    })?;
    if domain.trim().is_empty() {
        return Err(ApiResponse::error(
            http::StatusCode::BAD_REQUEST,
            "Domain parameter required",
        ));
    }
    Ok(domain.into_owned())
}

/// Manager service answering the configuration API
#[derive(Clone)]
pub struct ManagerProxy {
    pub store: Arc<dyn DocumentStore>,
    pub notes: Arc<NotesStore>,
    pub containers: Option<Arc<ContainerDiscovery>>,
}

impl ManagerProxy {
    /// Route one API request and build its response
    pub async fn handle(&self, method: &str, path: &str, body: &[u8]) -> ApiResponse {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match (method, segments.as_slice()) {
            ("GET", ["api", "config"]) => self.get_config(),
            ("POST", ["api", "config"]) => self.post_config(body),
            ("GET", ["api", "notes"]) => {
                ApiResponse::json(http::StatusCode::OK, &self.notes.get_notes())
            }
            ("POST", ["api", "notes"]) => self.post_note(body),
            ("DELETE", ["api", "notes", domain]) => match path_domain(domain) {
                Ok(domain) => self.delete_note(&domain),
                Err(response) => response,
            },
            ("POST", ["api", "hosts"]) => self.post_host(body),
            ("DELETE", ["api", "hosts", domain]) => match path_domain(domain) {
                Ok(domain) => self.delete_host(&domain),
                Err(response) => response,
            },
            ("GET", ["api", "containers"]) => self.get_containers().await,
            (_, ["api", "config"])
            | (_, ["api", "notes", ..])
            | (_, ["api", "hosts", ..])
            | (_, ["api", "containers"]) => {
                ApiResponse::error(http::StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            _ => ApiResponse::error(http::StatusCode::NOT_FOUND, "Not found"),
        }
    }

    fn get_config(&self) -> ApiResponse {
        match file_manager::get_config(self.store.as_ref()) {
            Ok(snapshot) => ApiResponse::json(http::StatusCode::OK, &snapshot),
            Err(e) => {
                error!("Error loading config: {}", e);
                ApiResponse::error(http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    fn post_config(&self, body: &[u8]) -> ApiResponse {
        let input: ConfigInput = match serde_json::from_slice(body) {
            Ok(input) => input,
            Err(e) => {
                return ApiResponse::error(
                    http::StatusCode::BAD_REQUEST,
                    &format!("Invalid request format: {}", e),
                );
            }
        };

        if let Err(e) = file_manager::update_config(self.store.as_ref(), &input) {
            warn!("Rejected config update: {}", e);
            return ApiResponse::error(config_error_status(&e), &e.to_string());
        }

        // Notes only live as long as a route answers for their domain
        let domains = file_manager::routed_domains(&input);
        if let Err(e) = self.notes.retain_notes(|domain| domains.contains(domain)) {
            warn!("Config saved but stale notes were not removed: {}", e);
        }
        ApiResponse::success()
    }

    fn post_host(&self, body: &[u8]) -> ApiResponse {
        let request: HostRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                return ApiResponse::error(
                    http::StatusCode::BAD_REQUEST,
                    &format!("Invalid request format: {}", e),
                );
            }
        };

        let domain = request.domain.trim();
        let container_id = request.container_id.trim();
        if domain.is_empty() || container_id.is_empty() {
            return ApiResponse::error(
                http::StatusCode::BAD_REQUEST,
                "Domain and containerId parameters required",
            );
        }

        let backend = format!("{}:{}", container_id, request.port.unwrap_or(MINECRAFT_PORT));
        if let Err(e) = file_manager::add_host(self.store.as_ref(), domain, &backend) {
            error!("Error adding host {}: {}", domain, e);
            return ApiResponse::error(config_error_status(&e), &e.to_string());
        }

        if !request.note.trim().is_empty() {
            if let Err(e) = self.notes.set_note(domain, &request.note) {
                error!("Host {} added but its note was not saved: {}", domain, e);
                return ApiResponse::error(http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
            }
        }
        ApiResponse::success()
    }

    fn delete_host(&self, domain: &str) -> ApiResponse {
        match file_manager::remove_host(self.store.as_ref(), domain) {
            Ok(false) => debug!("No route for {}, nothing to remove", domain),
            Ok(true) => {}
            Err(e) => {
                error!("Error removing host {}: {}", domain, e);
                return ApiResponse::error(config_error_status(&e), &e.to_string());
            }
        }
        self.delete_note(domain)
    }

    fn post_note(&self, body: &[u8]) -> ApiResponse {
        let request: NoteRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                return ApiResponse::error(
                    http::StatusCode::BAD_REQUEST,
                    &format!("Invalid request format: {}", e),
                );
            }
        };

        if request.domain.trim().is_empty() {
            return ApiResponse::error(http::StatusCode::BAD_REQUEST, "Domain parameter required");
        }

        match self.notes.set_note(request.domain.trim(), &request.note) {
            Ok(()) => ApiResponse::success(),
            Err(e) => {
                error!("Error saving note: {}", e);
                ApiResponse::error(http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    fn delete_note(&self, domain: &str) -> ApiResponse {
        match self.notes.remove_note(domain) {
            Ok(()) => ApiResponse::success(),
            Err(e) => {
                error!("Error removing note: {}", e);
                ApiResponse::error(http::StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
            }
        }
    }

    async fn get_containers(&self) -> ApiResponse {
        match &self.containers {
            Some(discovery) => ApiResponse::json(
                http::StatusCode::OK,
                &discovery.list_minecraft_containers().await,
            ),
            None => ApiResponse::error(
                http::StatusCode::SERVICE_UNAVAILABLE,
                "Docker is not configured",
            ),
        }
    }

    async fn read_body(session: &mut Session) -> std::result::Result<Vec<u8>, String> {
        let mut body = Vec::new();
        loop {
            match session.downstream_session.read_request_body().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > MAX_BODY_BYTES {
                        return Err(format!("Request body exceeds {} bytes", MAX_BODY_BYTES));
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return Err(format!("Failed to read request body: {}", e)),
            }
        }
        Ok(body)
    }

    async fn respond(&self, session: &mut Session, response: ApiResponse) -> Result<bool> {
        let body = serde_json::to_vec(&response.body).unwrap_or_else(|_| {
            String::from("{\"error\":\"Failed to serialize response\"}").into_bytes()
        });

        let mut resp = ResponseHeader::build(response.status, None)?;
        resp.insert_header("content-type", "application/json")?;
        resp.insert_header("content-length", body.len().to_string())?;
        resp.insert_header("connection", "close")?;

        session.write_response_header(Box::new(resp), false).await?;
        session
            .write_response_body(Some(Bytes::from(body)), true)
            .await?;

        session.response_written();
        session.set_keepalive(None);

        Ok(true)
    }
}

#[async_trait::async_trait]
impl ProxyHttp for ManagerProxy {
    type CTX = ();

    fn new_ctx(&self) -> Self::CTX {}

    async fn request_filter(&self, session: &mut Session, _ctx: &mut Self::CTX) -> Result<bool> {
        let method = session.req_header().method.as_str().to_string();
        let path = session.req_header().uri.path().to_string();
        debug!("Manager request: {} {}", method, path);

        let response = match Self::read_body(session).await {
            Ok(body) => self.handle(&method, &path, &body).await,
            Err(message) => ApiResponse::error(http::StatusCode::BAD_REQUEST, &message),
        };

        info!("{} {} -> {}", method, path, response.status.as_u16());

        // Every request is answered here; nothing is proxied upstream
        self.respond(session, response).await
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        // request_filter always responds, so this is never used
        let res = HttpPeer::new("127.0.0.1:80", false, "".to_string());
        Ok(Box::new(res))
    }
}
