use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use actix_web::http::Method;
use actix_web::web::Bytes;
use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};

/// Everything needed to issue one request.
///
/// Each call builds a fresh value, so nothing from a previous request can leak
/// into the next one.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: String,
    /// Query parameters for GET-like methods, form fields otherwise
    pub parameters: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
    pub server: ServerParams,
    /// Raw body; takes precedence over form parameters and files
    pub body: Option<Bytes>,
    /// Record the request in the client's browsing history
    pub update_history: bool,
}

impl RequestContext {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            parameters: Vec::new(),
            files: Vec::new(),
            server: ServerParams::default(),
            body: None,
            update_history: true,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn server_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.server.insert(name, value);
        self
    }

    /// Shortcut for an `HTTP_*` server parameter.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.server.insert_header(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .server_param("CONTENT_TYPE", "application/json")
            .body(body))
    }

    pub fn without_history(mut self) -> Self {
        self.update_history = false;
        self
    }

    /// Whether parameters travel in the query string rather than the body.
    pub fn parameters_in_query(&self) -> bool {
        !matches!(
            self.method,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH
        )
    }

    /// Follow-up GET used when a redirect is followed. Server parameters are
    /// kept; parameters, files and body are dropped.
    pub(crate) fn redirect_to(&self, target: String) -> Self {
        Self {
            method: Method::GET,
            uri: target,
            parameters: Vec::new(),
            files: Vec::new(),
            server: self.server.clone(),
            body: None,
            update_history: self.update_history,
        }
    }
}

/// Server parameters in CGI form (`HTTP_ACCEPT`, `CONTENT_TYPE`, `REMOTE_ADDR`...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerParams(BTreeMap<String, String>);

impl ServerParams {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Store a header as `HTTP_<NAME>`, e.g. `x-api-key` becomes `HTTP_X_API_KEY`.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        let key = format!("HTTP_{}", name.replace('-', "_").to_ascii_uppercase());
        self.0.insert(key, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Header name/value pairs derived from the parameters.
    ///
    /// `CONTENT_LENGTH` is skipped: it is computed from the payload.
    pub fn headers(&self) -> impl Iterator<Item = (String, &str)> {
        self.0.iter().filter_map(|(key, value)| {
            let name = if let Some(rest) = key.strip_prefix("HTTP_") {
                rest.replace('_', "-").to_ascii_lowercase()
            } else if key == "CONTENT_TYPE" || key == "CONTENT_MD5" {
                key.replace('_', "-").to_ascii_lowercase()
            } else {
                return None;
            };
            Some((name, value.as_str()))
        })
    }

    /// Peer address from `REMOTE_ADDR`, if present.
    pub fn remote_addr(&self) -> HarnessResult<Option<SocketAddr>> {
        let Some(raw) = self.get("REMOTE_ADDR") else {
            return Ok(None);
        };
        raw.parse::<SocketAddr>()
            .or_else(|_| raw.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, 0)))
            .map(Some)
            .map_err(|_| HarnessError::InvalidHeader {
                name: "REMOTE_ADDR".to_string(),
                message: format!("'{}' is not an IP address", raw),
            })
    }
}

/// A file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: "application/octet-stream".to_string(),
            content: content.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read a file from disk; the file name is the last path component.
    pub fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(field, file_name, content))
    }
}
