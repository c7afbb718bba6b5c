//! Authenticated JSON request client.
//!
//! [`HttpClient`] issues exactly one request per call. Credentials live in a
//! caller-owned [`Session`] that is passed by mutable reference, so the cookie
//! jar is only ever updated from a live response and never shared between
//! in-flight requests.

use std::fmt;
use std::time::Duration;

pub use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, SET_COOKIE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Result;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("flowpush/", env!("CARGO_PKG_VERSION"));

/// Which credential a request will present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
	Anonymous,
	Token,
	Cookies,
}

/// Credentials for the current process.
///
/// Holds an optional bearer token and the cookie jar captured from the most
/// recent response that set cookies. A token takes precedence when deciding
/// the [`AuthMode`], but both are sent when present.
#[derive(Debug, Clone, Default)]
pub struct Session {
	bearer_token: Option<String>,
	cookies: Vec<String>,
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(token: impl Into<String>) -> Self {
		Self {
			bearer_token: Some(token.into()),
			cookies: Vec::new(),
		}
	}

	pub fn bearer_token(&self) -> Option<&str> {
		self.bearer_token.as_deref()
	}

	/// Sets the bearer token. Cookies are left untouched.
	pub fn set_token(&mut self, token: impl Into<String>) {
		self.bearer_token = Some(token.into());
	}

	pub fn clear_token(&mut self) {
		self.bearer_token = None;
	}

	/// Cookie `name=value` pairs in the order the server sent them.
	pub fn cookies(&self) -> &[String] {
		&self.cookies
	}

	/// Value for the `Cookie` request header, if the jar is non-empty.
	pub fn cookie_header(&self) -> Option<String> {
		(!self.cookies.is_empty()).then(|| self.cookies.join("; "))
	}

	pub fn mode(&self) -> AuthMode {
		if self.bearer_token.is_some() {
			AuthMode::Token
		} else if !self.cookies.is_empty() {
			AuthMode::Cookies
		} else {
			AuthMode::Anonymous
		}
	}

	/// Replaces the jar wholesale; responses never merge into older cookies.
	pub(crate) fn replace_cookies(&mut self, cookies: Vec<String>) {
		self.cookies = cookies;
	}
}

/// Response body, parsed as JSON when possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
	Structured(Value),
	Raw(String),
}

impl ResponseBody {
	/// Parses `text` as JSON, keeping it unmodified when it is not.
	pub fn parse(text: String) -> Self {
		match serde_json::from_str(&text) {
			Ok(value) => ResponseBody::Structured(value),
			Err(_) => ResponseBody::Raw(text),
		}
	}

	pub fn as_json(&self) -> Option<&Value> {
		match self {
			ResponseBody::Structured(value) => Some(value),
			ResponseBody::Raw(_) => None,
		}
	}

	/// Decodes a structured body into `T`. Raw bodies and shape mismatches yield `None`.
	pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
		self.as_json().and_then(|value| serde_json::from_value(value.clone()).ok())
	}

	/// Single-line rendering truncated to `max_chars`, for logs.
	pub fn preview(&self, max_chars: usize) -> String {
		let text = self.to_string();
		if text.chars().count() <= max_chars {
			return text;
		}
		let cut: String = text.chars().take(max_chars).collect();
		format!("{cut}...")
	}
}

impl fmt::Display for ResponseBody {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResponseBody::Structured(value) => write!(f, "{value}"),
			ResponseBody::Raw(text) => f.write_str(text),
		}
	}
}

/// A completed exchange. Any status code is a successful call at this layer.
#[derive(Debug, Clone)]
pub struct HttpResponse {
	pub status: u16,
	pub body: ResponseBody,
	pub headers: HeaderMap,
}

impl HttpResponse {
	pub fn is_ok(&self) -> bool {
		self.status == 200
	}
}

/// Single-attempt JSON client bound to the service base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
	inner: reqwest::Client,
	base_url: Url,
}

impl HttpClient {
	/// Creates a client for `base_url`. `timeout` of `None` keeps the transport default.
	pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
		let base_url = Url::parse(base_url)?;
		let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		Ok(Self {
			inner: builder.build()?,
			base_url,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Appends `endpoint` to the base URL, keeping any base path prefix. Absolute URLs pass through.
	pub fn resolve(&self, endpoint: &str) -> Result<Url> {
		if let Ok(absolute) = Url::parse(endpoint) {
			return Ok(absolute);
		}
		let base = self.base_url.as_str().trim_end_matches('/');
		let endpoint = endpoint.trim_start_matches('/');
		Ok(Url::parse(&format!("{base}/{endpoint}"))?)
	}

	/// Sends one request, presenting and updating `session`.
	///
	/// Fails only on transport errors; HTTP error statuses are returned to the caller.
	pub async fn request(&self, session: &mut Session, method: Method, endpoint: &str, body: Option<&Value>) -> Result<HttpResponse> {
		let url = self.resolve(endpoint)?;
		debug!(%method, %url, mode = ?session.mode(), "sending request");

		let mut request = self
			.inner
			.request(method, url)
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json");
		if let Some(token) = session.bearer_token() {
			request = request.bearer_auth(token);
		}
		if let Some(cookie) = session.cookie_header() {
			request = request.header(COOKIE, cookie);
		}
		if let Some(body) = body {
			request = request.body(serde_json::to_vec(body)?);
		}

		let response = request.send().await?;
		let status = response.status().as_u16();
		let headers = response.headers().clone();

		let received = cookie_pairs(&headers);
		if !received.is_empty() {
			debug!(count = received.len(), "session cookies replaced");
			session.replace_cookies(received);
		}

		let text = response.text().await?;
		debug!(status, bytes = text.len(), "response received");

		Ok(HttpResponse {
			status,
			body: ResponseBody::parse(text),
			headers,
		})
	}

	pub async fn get(&self, session: &mut Session, endpoint: &str) -> Result<HttpResponse> {
		self.request(session, Method::GET, endpoint, None).await
	}
}

/// Extracts `name=value` from every `Set-Cookie` header, dropping attributes.
fn cookie_pairs(headers: &HeaderMap) -> Vec<String> {
	headers
		.get_all(SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.filter_map(|value| value.split(';').next())
		.map(str::trim)
		.filter(|pair| !pair.is_empty())
		.map(str::to_string)
		.collect()
}
