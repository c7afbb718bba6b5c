//! Workflow definition format.
//!
//! Only the fields flowpush reasons about are typed. Everything else the
//! service or its editor writes (connections, settings, tags, static data)
//! is kept in the flattened `extra` maps so a definition survives a
//! load/push cycle without losing data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A workflow definition: metadata plus an ordered list of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
	/// Remote identifier. Exported files do not always carry one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name.
	pub name: String,
	/// Whether the workflow is live on the remote service.
	#[serde(default)]
	pub active: bool,
	/// Nodes in definition order.
	pub nodes: Vec<Node>,
	/// Fields not modelled above, preserved verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl WorkflowDefinition {
	/// Removes a top-level field not modelled by this type.
	///
	/// Returns the removed value, if the field was present.
	pub fn remove_field(&mut self, field: &str) -> Option<Value> {
		self.extra.remove(field)
	}
}

/// A single node of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Node kind identifier, e.g. `n8n-nodes-base.webhook`.
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub parameters: Map<String, Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Node {
	/// Returns a string parameter, treating empty strings as unset.
	pub fn parameter_str(&self, key: &str) -> Option<&str> {
		self.parameters.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn unknown_fields_survive_round_trip() {
		let raw = json!({
			"id": "wf1",
			"name": "UGC",
			"nodes": [{
				"id": "n1",
				"type": "n8n-nodes-base.webhook",
				"typeVersion": 2,
				"parameters": { "path": "generate" }
			}],
			"connections": { "Webhook": { "main": [] } },
			"settings": { "executionOrder": "v1" }
		});

		let def: WorkflowDefinition = serde_json::from_value(raw.clone()).unwrap();
		assert_eq!(def.extra.get("connections"), raw.get("connections"));
		assert_eq!(def.nodes[0].extra.get("typeVersion"), Some(&json!(2)));

		let back = serde_json::to_value(&def).unwrap();
		assert_eq!(back["settings"], raw["settings"]);
		assert_eq!(back["nodes"][0]["type"], "n8n-nodes-base.webhook");
	}

	#[test]
	fn active_defaults_to_false() {
		let def: WorkflowDefinition = serde_json::from_value(json!({ "name": "x", "nodes": [] })).unwrap();
		assert!(!def.active);
		assert!(def.id.is_none());
	}

	#[test]
	fn parameter_str_ignores_blank_values() {
		let node: Node = serde_json::from_value(json!({
			"type": "webhook",
			"parameters": { "path": "  ", "method": "POST", "count": 3 }
		}))
		.unwrap();

		assert_eq!(node.parameter_str("path"), None);
		assert_eq!(node.parameter_str("method"), Some("POST"));
		assert_eq!(node.parameter_str("count"), None);
	}
}
