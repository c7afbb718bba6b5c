//! Error types for flowpush.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::ResponseBody;

/// Result type alias for flowpush operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while authenticating, loading or deploying a workflow.
#[derive(Debug, Error)]
pub enum Error {
	/// Transport-level failure (DNS, connect, TLS, timeout).
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Workflow definition file does not exist.
	#[error("Workflow definition not found: {}", path.display())]
	NotFound { path: PathBuf },

	/// Workflow definition exists but is not deployable.
	#[error("Invalid workflow definition {}: {reason}", path.display())]
	Validation { path: PathBuf, reason: String },

	/// Access probe, token check or credential exchange failed.
	#[error("Authentication failed: {0}")]
	Authentication(String),

	/// Push call answered with a non-200 status.
	#[error("Deployment rejected with status {status}")]
	Deployment { status: u16, body: ResponseBody },

	/// A read-only API call answered with something other than `200`.
	#[error("Unexpected status {status} from {endpoint}")]
	UnexpectedStatus { endpoint: String, status: u16, body: ResponseBody },

	/// A call answered `200` with a body of an unrecognised shape.
	#[error("Unrecognised response body from {endpoint}")]
	UnexpectedBody { endpoint: String, body: ResponseBody },

	/// Base URL or endpoint could not be parsed.
	#[error("Invalid URL: {0}")]
	InvalidUrl(#[from] url::ParseError),

	#[error("Invalid placeholder pattern: {0}")]
	Pattern(#[from] regex::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Raw remote response attached to this error, if any.
	pub fn response_body(&self) -> Option<&ResponseBody> {
		match self {
			Error::Deployment { body, .. } | Error::UnexpectedStatus { body, .. } | Error::UnexpectedBody { body, .. } => Some(body),
			_ => None,
		}
	}
}
