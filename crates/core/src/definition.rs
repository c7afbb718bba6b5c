//! Loading workflow definitions from disk.

use std::fs;
use std::path::Path;

use flowpush_protocol::WorkflowDefinition;
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};

/// Reads and validates a deployable workflow definition.
///
/// The file must be a JSON object with a string `name` and a non-empty
/// `nodes` array whose entries each carry a string `type`. Anything less is a
/// hard failure naming `path`; there is no lenient mode.
pub fn load(path: &Path) -> Result<WorkflowDefinition> {
	if !path.exists() {
		return Err(Error::NotFound { path: path.to_path_buf() });
	}

	let content = fs::read_to_string(path)?;
	let invalid = |reason: String| Error::Validation {
		path: path.to_path_buf(),
		reason,
	};

	let raw: Value = serde_json::from_str(&content).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
	check_shape(&raw).map_err(invalid)?;

	let definition: WorkflowDefinition = serde_json::from_value(raw).map_err(|e| invalid(e.to_string()))?;
	info!(
		path = %path.display(),
		name = %definition.name,
		nodes = definition.nodes.len(),
		"workflow definition loaded"
	);
	Ok(definition)
}

fn check_shape(raw: &Value) -> std::result::Result<(), String> {
	let object = raw.as_object().ok_or("top-level value must be an object")?;

	match object.get("name") {
		Some(Value::String(_)) => {}
		Some(_) => return Err("`name` must be a string".into()),
		None => return Err("missing `name`".into()),
	}

	let nodes = match object.get("nodes") {
		Some(Value::Array(nodes)) => nodes,
		Some(_) => return Err("`nodes` must be an array".into()),
		None => return Err("missing `nodes` sequence".into()),
	};
	if nodes.is_empty() {
		return Err("`nodes` is empty".into());
	}

	for (index, node) in nodes.iter().enumerate() {
		if !node.get("type").is_some_and(Value::is_string) {
			return Err(format!("node {index} has no string `type`"));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use tempfile::TempDir;

	use super::*;

	fn write(dir: &TempDir, content: &str) -> PathBuf {
		let path = dir.path().join("workflow.json");
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn loads_valid_definition() {
		let dir = TempDir::new().unwrap();
		let path = write(
			&dir,
			r#"{"id":"w1","name":"UGC","nodes":[{"id":"n1","type":"webhook","parameters":{"path":"generate"}}],"pinData":{}}"#,
		);

		let def = load(&path).unwrap();
		assert_eq!(def.name, "UGC");
		assert_eq!(def.id.as_deref(), Some("w1"));
		assert_eq!(def.nodes.len(), 1);
		assert!(def.extra.contains_key("pinData"));
	}

	#[test]
	fn missing_file_is_not_found() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("absent.json");
		match load(&path).unwrap_err() {
			Error::NotFound { path: reported } => assert_eq!(reported, path),
			other => panic!("expected NotFound, got {other:?}"),
		}
	}

	#[test]
	fn malformed_json_is_validation_error_with_path() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "{ name: UGC, nodes: [ }");

		let err = load(&path).unwrap_err();
		assert!(matches!(&err, Error::Validation { path: p, .. } if *p == path));
		assert!(err.to_string().contains("workflow.json"));
	}

	#[test]
	fn shape_violations_are_rejected() {
		let cases = [
			(r#"[1, 2]"#, "object"),
			(r#"{"nodes":[{"type":"x"}]}"#, "missing `name`"),
			(r#"{"name":"x"}"#, "missing `nodes`"),
			(r#"{"name":"x","nodes":{}}"#, "must be an array"),
			(r#"{"name":"x","nodes":[]}"#, "empty"),
			(r#"{"name":"x","nodes":[{"id":"n1"}]}"#, "node 0"),
		];

		let dir = TempDir::new().unwrap();
		for (content, expected) in cases {
			let path = write(&dir, content);
			let err = load(&path).unwrap_err();
			assert!(
				matches!(&err, Error::Validation { reason, .. } if reason.contains(expected)),
				"{content}: expected reason containing {expected:?}, got {err}"
			);
		}
	}
}
