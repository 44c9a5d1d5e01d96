//! HTTP/1.1 request parsing using the [`httparse`] crate.
//!
//! The raw query string is kept verbatim and is the one piece of a request the
//! router writes to: captured path variables are appended to it as ordinary
//! `key=value` pairs, so handlers read them back with [`Request::query_param`].

use std::collections::HashMap;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;

use super::{Headers, Method};

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// A parsed HTTP/1.1 request.
///
/// # Examples
///
/// ```
/// use segroute::http::Request;
///
/// let raw = b"GET /search?q=rust+router&page=2 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.query_string(), "q=rust+router&page=2");
/// assert_eq!(request.query_param("q"), Some("rust router"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    query: String,
    body: Bytes,
    // Decoded view of `query`, rebuilt whenever the raw string changes.
    params: HashMap<String, String>,
}

impl Request {
    const MAX_HEADERS: usize = 64;

    /// Builds a request without going through the wire format.
    ///
    /// `target` is the request-target as it would appear on the request line,
    /// so anything after the first `?` becomes the query string.
    ///
    /// ```
    /// use segroute::http::{Method, Request};
    ///
    /// let req = Request::new(Method::Get, "/users/42?verbose=1");
    /// assert_eq!(req.path(), "/users/42");
    /// assert_eq!(req.query_param("verbose"), Some("1"));
    /// ```
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        let mut request = Self {
            method,
            path,
            version: 1,
            headers: Headers::new(),
            query: String::new(),
            body: Bytes::new(),
            params: HashMap::new(),
        };
        request.set_query_string(query);
        request
    }

    /// Parses a request from a byte slice.
    ///
    /// Returns the request and the offset in `buf` where the body begins.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`]: the header block has not fully arrived.
    /// - [`RequestError::Parse`]: the bytes are not a valid HTTP/1.x request.
    /// - [`RequestError::MissingField`]: method, path or version is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method = match raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse::<Method>()
        {
            Ok(method) => method,
            Err(never) => match never {},
        };

        let target = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let mut request = Self::new(method, target);
        request.version = version;
        request.headers = header_map;
        request.body = Bytes::copy_from_slice(&buf[body_offset..]);

        Ok((request, body_offset))
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the percent-decoded request path, without the query string.
    ///
    /// This is what the router matches against, so `/users/john%20doe`
    /// captures `john doe`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version: `0` for HTTP/1.0, `1` for HTTP/1.1.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the raw query string without the leading `?`; empty when absent.
    pub fn query_string(&self) -> &str {
        &self.query
    }

    /// Replaces the raw query string and refreshes the decoded parameters.
    pub fn set_query_string(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.params = parse_query_string(&self.query);
    }

    /// Returns the decoded value of the first query pair named `key`.
    ///
    /// Path variables captured by the router are visible here under their
    /// prefixed names, e.g. `":userID"` or `"*filepath"`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the body bytes.
    ///
    /// After [`parse`](Self::parse) this is everything past the header block;
    /// the server trims it to `Content-Length` before dispatch.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Returns `true` if the connection should stay open after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive; HTTP/1.0 needs an explicit
    /// `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1,
        }
    }

    /// Returns the parsed `Content-Length` header.
    ///
    /// # Returns
    ///
    /// `None` when the header is missing or not a valid `usize`.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.parse().ok()
    }
}

// The path is percent-decoded once here; the query stays raw.
fn split_target(target: &str) -> (String, String) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    (decode_path(path), query.to_owned())
}

// Unlike query components, `+` in a path is a literal plus sign.
fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Decodes one `application/x-www-form-urlencoded` component.
pub(crate) fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

// First occurrence of a key wins, so appended pairs never shadow earlier ones.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/");
        assert_eq!(req.version(), 1);
        assert_eq!(req.query_string(), "");
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn parse_keeps_raw_query() {
        let raw = b"GET /search?q=a%26b&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query_string(), "q=a%26b&page=2");
        assert_eq!(req.query_param("q"), Some("a&b"));
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[test]
    fn path_is_percent_decoded() {
        let raw = b"GET /caf%C3%A9/john%20doe+x?q=a%20b HTTP/1.1\r\nHost: x\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/café/john doe+x");
        assert_eq!(req.query_string(), "q=a%20b");
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn first_value_wins() {
        let req = Request::new(Method::Get, "/?a=1&a=2");
        assert_eq!(req.query_param("a"), Some("1"));
    }

    #[test]
    fn set_query_string_refreshes_params() {
        let mut req = Request::new(Method::Get, "/x?a=1");
        req.set_query_string("a=1&%3Aid=42");
        assert_eq!(req.query_param(":id"), Some("42"));
        req.set_query_string("");
        assert_eq!(req.query_param("a"), None);
    }

    #[test]
    fn decode_handles_plus_and_escapes() {
        assert_eq!(decode_component("js%2Fjquery.js"), "js/jquery.js");
        assert_eq!(decode_component("a+b"), "a b");
        assert_eq!(decode_component("%2Afilepath"), "*filepath");
    }

    #[test]
    fn keep_alive_rules() {
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        assert!(req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\nHost: x\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
        let (req, _) =
            Request::parse(b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn content_length() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&raw[body_offset..], b"hello");
        assert_eq!(req.body().as_ref(), b"hello");
    }
}
