//! Result envelope printed on stdout.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": false,
//!   "command": "deploy",
//!   "error": {
//!     "code": "DEPLOYMENT_FAILED",
//!     "message": "push failed: Deployment rejected with status 400",
//!     "details": { "stage": "push", "report": { ... } }
//!   },
//!   "durationMs": 412
//! }
//! ```
//!
//! The staged log is separate and goes to stderr.


use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use flowpush::protocol::WorkflowSummary;
use flowpush::{AuthMethod, AuthMode};
use serde::Serialize;
use serde_json::Value;

pub const SCHEMA_VERSION: u32 = 1;

/// How results are rendered on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// TOON (token-efficient for LLMs)
	Toon,
	/// Pretty-printed JSON
	Json,
	/// One JSON object per line
	Ndjson,
	/// Data as indented JSON, diagnostics as tagged lines (default)
	#[default]
	Text,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	/// `deploy`, `auth`, `auth.quick` or `auth.check`
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub inputs: Option<CommandInputs>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	pub duration_ms: u64,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub diagnostics: Vec<Diagnostic>,
}

/// Resolved settings the command ran with.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandInputs {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	/// Failing stage, partial report or raw remote response
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

/// Stable error classes for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Session probe, token check or credential exchange failed
	AuthError,
	/// Definition is not deployable
	ValidationError,
	/// Definition file does not exist
	NotFound,
	/// Push rejected by the service
	DeploymentFailed,
	NetworkError,
	ConfigError,
	IoError,
	InternalError,
}

impl ErrorCode {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::AuthError => "AUTH_ERROR",
			ErrorCode::ValidationError => "VALIDATION_ERROR",
			ErrorCode::NotFound => "NOT_FOUND",
			ErrorCode::DeploymentFailed => "DEPLOYMENT_FAILED",
			ErrorCode::NetworkError => "NETWORK_ERROR",
			ErrorCode::ConfigError => "CONFIG_ERROR",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Serialize)]
pub struct Diagnostic {
	pub level: DiagnosticLevel,
	pub message: String,
	/// Pipeline stage that raised it: `activate`, `verify` or `substitute`
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
	Info,
	Warning,
}

pub struct ResultBuilder<T: Serialize> {
	result: CommandResult<T>,
	started: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			result: CommandResult {
				schema_version: SCHEMA_VERSION,
				ok: false,
				command: command.into(),
				inputs: None,
				data: None,
				error: None,
				duration_ms: 0,
				diagnostics: Vec::new(),
			},
			started: Instant::now(),
		}
	}

	/// Measures the duration from `start` instead of builder creation.
	pub fn started_at(mut self, start: Instant) -> Self {
		self.started = start;
		self
	}

	pub fn inputs(mut self, inputs: CommandInputs) -> Self {
		self.result.inputs = Some(inputs);
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.result.data = Some(data);
		self
	}

	pub fn error(mut self, error: CommandError) -> Self {
		self.result.error = Some(error);
		self
	}

	pub fn info(mut self, message: impl Into<String>) -> Self {
		self.result.diagnostics.push(Diagnostic {
			level: DiagnosticLevel::Info,
			message: message.into(),
			source: None,
		});
		self
	}

	pub fn warning(mut self, source: &str, message: impl Into<String>) -> Self {
		self.result.diagnostics.push(Diagnostic {
			level: DiagnosticLevel::Warning,
			message: message.into(),
			source: Some(source.to_string()),
		});
		self
	}

	/// A result is `ok` only with data and without an error.
	pub fn build(mut self) -> CommandResult<T> {
		self.result.ok = self.result.error.is_none() && self.result.data.is_some();
		self.result.duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
		self.result
	}
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	let rendered = match format {
		OutputFormat::Toon => serde_json::to_value(result).map(|value| toon::encode(&value, None)),
		OutputFormat::Json => serde_json::to_string_pretty(result),
		OutputFormat::Ndjson => serde_json::to_string(result),
		OutputFormat::Text => return print_text(result),
	};
	if let Ok(rendered) = rendered {
		println!("{rendered}");
	}
}

fn print_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	match (&result.data, &result.error) {
		(_, Some(error)) => {
			let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
		}
		(Some(data), None) => {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(stdout, "{json}");
			}
		}
		(None, None) => {}
	}

	for diag in &result.diagnostics {
		let level = match diag.level {
			DiagnosticLevel::Info => "info",
			DiagnosticLevel::Warning => "warning",
		};
		let _ = match &diag.source {
			Some(source) => writeln!(stdout, "[{level}:{source}] {}", diag.message),
			None => writeln!(stdout, "[{level}] {}", diag.message),
		};
	}
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}

/// Data of `auth` and `auth --quick`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
	/// Absent when quick mode was skipped
	#[serde(skip_serializing_if = "Option::is_none")]
	pub method: Option<AuthMethod>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub mode: Option<AuthMode>,
	/// Masked
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<String>,
	/// Ready-to-run command line (quick mode)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub hint: Option<String>,
	pub skipped: bool,
}

/// Data of `auth check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCheckData {
	/// Masked
	pub token: String,
	pub workflow_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_id: Option<String>,
	/// Whether the configured workflow is visible to the token
	#[serde(skip_serializing_if = "Option::is_none")]
	pub found: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub active: Option<bool>,
	/// First few workflows, listed when the configured one was not found
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub workflows: Vec<WorkflowSummary>,
}
