use std::path::PathBuf;

use flowpush::{DeployHalt, Error as FlowError};
use serde_json::json;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// The pipeline stopped at a fatal stage; carries the partial report.
	#[error(transparent)]
	Halt(Box<DeployHalt>),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("invalid configuration file {}: {reason}", path.display())]
	ConfigFile { path: PathBuf, reason: String },

	#[error(transparent)]
	Flowpush(#[from] FlowError),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl From<DeployHalt> for CliError {
	fn from(halt: DeployHalt) -> Self {
		CliError::Halt(Box::new(halt))
	}
}

/// Maps a library error to its error code and optional details.
fn classify(err: &FlowError) -> (ErrorCode, Option<serde_json::Value>) {
	match err {
		FlowError::Network(_) => (ErrorCode::NetworkError, None),
		FlowError::NotFound { path } => (ErrorCode::NotFound, Some(json!({ "path": path }))),
		FlowError::Validation { path, reason } => (ErrorCode::ValidationError, Some(json!({ "path": path, "reason": reason }))),
		FlowError::Authentication(_) => (ErrorCode::AuthError, None),
		FlowError::Deployment { status, body } => (ErrorCode::DeploymentFailed, Some(json!({ "status": status, "response": body }))),
		FlowError::UnexpectedStatus { endpoint, status, body } => {
			let code = if matches!(status, 401 | 403) {
				ErrorCode::AuthError
			} else {
				ErrorCode::InternalError
			};
			(code, Some(json!({ "endpoint": endpoint, "status": status, "response": body })))
		}
		FlowError::UnexpectedBody { endpoint, body } => (ErrorCode::InternalError, Some(json!({ "endpoint": endpoint, "response": body }))),
		FlowError::InvalidUrl(_) => (ErrorCode::ConfigError, None),
		FlowError::Io(_) => (ErrorCode::IoError, None),
		FlowError::Pattern(_) | FlowError::Json(_) => (ErrorCode::InternalError, None),
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Halt(halt) => {
				let (code, _) = classify(&halt.error);
				let mut details = json!({ "stage": halt.stage, "report": halt.report });
				if let Some(body) = halt.error.response_body() {
					details["response"] = json!(body);
				}
				(code, Some(details))
			}
			CliError::Config(_) => (ErrorCode::ConfigError, None),
			CliError::ConfigFile { path, .. } => (ErrorCode::ConfigError, Some(json!({ "path": path }))),
			CliError::Flowpush(err) => classify(err),
			CliError::Io(_) => (ErrorCode::IoError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}
