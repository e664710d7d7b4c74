//! Conditional static file delivery.
//!
//! [`StaticFiles`] resolves request paths inside a root directory and answers
//! either with the file content or, when the client's cached copy is still
//! valid, with `304 Not Modified`.
//!
//! # Validators
//!
//! Each file gets an `ETag` derived from its modification time and size, and
//! a `Last-Modified` date. A request is "not modified" when:
//!
//! - `If-None-Match` lists the current ETag (or `*`), or
//! - `If-None-Match` is absent and `If-Modified-Since` is not older than
//!   `Last-Modified`.
//!
//! A 304 response keeps only the headers listed in [`NOT_MODIFIED_HEADERS`].

mod validators;

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, DATE, ETAG, LAST_MODIFIED,
};
use http::{HeaderMap, HeaderValue, StatusCode};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::FileError;

pub use validators::{
    etag_for, http_date, is_not_modified, not_modified_headers, NOT_MODIFIED_HEADERS,
};

// =============================================================================
// Static File Entry
// =============================================================================

/// A regular file inside the served root, with the metadata used for
/// conditional responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFileEntry {
    /// Canonical path on disk
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,

    /// Last modification time
    pub modified: SystemTime,
}

impl StaticFileEntry {
    /// Quoted entity tag for this file state.
    pub fn etag(&self) -> String {
        etag_for(self.modified, self.size)
    }

    /// `Last-Modified` value (HTTP-date, second precision).
    pub fn last_modified(&self) -> String {
        http_date(self.modified)
    }

    /// Final path component, used for `Content-Disposition`.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Content type guessed from the file extension.
    pub fn content_type(&self) -> String {
        let mime = mime_guess::from_path(&self.path).first_or_octet_stream();
        if mime.type_() == mime_guess::mime::TEXT {
            format!("{}; charset=utf-8", mime.essence_str())
        } else {
            mime.essence_str().to_string()
        }
    }
}

// =============================================================================
// File Reply
// =============================================================================

/// Outcome of a static file request.
#[derive(Debug)]
pub enum FileReply {
    /// `200 OK` with the full header set and the opened file
    Content { headers: HeaderMap, file: File },

    /// `304 Not Modified` carrying only cache-relevant headers
    NotModified { headers: HeaderMap },
}

impl FileReply {
    pub fn status(&self) -> StatusCode {
        match self {
            FileReply::Content { .. } => StatusCode::OK,
            FileReply::NotModified { .. } => StatusCode::NOT_MODIFIED,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        match self {
            FileReply::Content { headers, .. } => headers,
            FileReply::NotModified { headers } => headers,
        }
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        match self {
            FileReply::Content { headers, file } => {
                let body = Body::from_stream(ReaderStream::new(file));
                (StatusCode::OK, headers, body).into_response()
            }
            FileReply::NotModified { headers } => {
                // An unsized empty body keeps axum from adding `content-length: 0`.
                let body = Body::from_stream(ReaderStream::new(tokio::io::empty()));
                (StatusCode::NOT_MODIFIED, headers, body).into_response()
            }
        }
    }
}

// =============================================================================
// Static Files
// =============================================================================

/// Serves regular files below a root directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    cache_max_age: Option<u32>,
}

impl StaticFiles {
    /// Serve files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_max_age: None,
        }
    }

    /// Add `Cache-Control: public, max-age=N` to every file response.
    pub fn with_cache_max_age(mut self, seconds: Option<u32>) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request path (relative to the mount) to a regular file.
    ///
    /// Rejects `..` segments and anything that resolves outside the root,
    /// including symlinks pointing elsewhere. Directories are reported as
    /// not found.
    pub async fn lookup(&self, request_path: &str) -> Result<StaticFileEntry, FileError> {
        let (entry, _file) = self.open(request_path).await?;
        Ok(entry)
    }

    /// Resolve and open a file, describing it from the opened handle so the
    /// metadata always matches the bytes that will be sent.
    async fn open(&self, request_path: &str) -> Result<(StaticFileEntry, File), FileError> {
        let relative = sanitize_path(request_path)?;

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| FileError::Io(format!("{}: {}", self.root.display(), e)))?;

        // Anything but a permission problem means there is no file here,
        // e.g. a path that continues below a regular file.
        let full_path = tokio::fs::canonicalize(root.join(&relative))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => FileError::from_io(request_path, e),
                _ => FileError::NotFound(request_path.to_string()),
            })?;

        if !full_path.starts_with(&root) {
            return Err(FileError::InvalidPath(request_path.to_string()));
        }

        let file = File::open(&full_path)
            .await
            .map_err(|e| FileError::from_io(request_path, e))?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| FileError::from_io(request_path, e))?;

        if !metadata.is_file() {
            return Err(FileError::NotFound(request_path.to_string()));
        }

        let modified = metadata
            .modified()
            .map_err(|e| FileError::from_io(request_path, e))?;

        let entry = StaticFileEntry {
            path: full_path,
            size: metadata.len(),
            modified,
        };
        Ok((entry, file))
    }

    /// Full response headers for an entry.
    pub fn file_headers(&self, entry: &StaticFileEntry) -> HeaderMap {
        let mut headers = HeaderMap::new();

        insert_header(&mut headers, CONTENT_TYPE, &entry.content_type());
        headers.insert(CONTENT_LENGTH, HeaderValue::from(entry.size));
        insert_header(&mut headers, LAST_MODIFIED, &entry.last_modified());
        insert_header(&mut headers, ETAG, &entry.etag());
        insert_header(
            &mut headers,
            CONTENT_DISPOSITION,
            &content_disposition(&entry.filename()),
        );
        insert_header(&mut headers, DATE, &http_date(SystemTime::now()));

        if let Some(max_age) = self.cache_max_age {
            insert_header(
                &mut headers,
                CACHE_CONTROL,
                &format!("public, max-age={}", max_age),
            );
        }

        headers
    }

    /// Answer a request for `request_path`.
    ///
    /// Callers are expected to have authorized the request already.
    pub async fn respond(
        &self,
        request_path: &str,
        request_headers: &HeaderMap,
    ) -> Result<FileReply, FileError> {
        let (entry, file) = self.open(request_path).await?;
        let headers = self.file_headers(&entry);

        if is_not_modified(&headers, request_headers) {
            debug!(path = request_path, "Client copy is current");
            return Ok(FileReply::NotModified {
                headers: not_modified_headers(&headers),
            });
        }

        Ok(FileReply::Content { headers, file })
    }
}

/// Split a request path into safe relative components.
fn sanitize_path(request_path: &str) -> Result<PathBuf, FileError> {
    let invalid = || FileError::InvalidPath(request_path.to_string());
    let mut relative = PathBuf::new();

    for segment in request_path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." || segment.contains('\\') || segment.contains('\0') {
            return Err(invalid());
        }

        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => relative.push(part),
            _ => return Err(invalid()),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(FileError::NotFound(request_path.to_string()));
    }

    Ok(relative)
}

fn content_disposition(filename: &str) -> String {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    format!("inline; filename=\"{}\"", escaped)
}

/// Insert a header, skipping values that are not valid header text.
fn insert_header(headers: &mut HeaderMap, name: http::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

// =============================================================================
// Tests
// =============================================================================
