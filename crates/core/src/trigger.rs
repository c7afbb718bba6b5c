//! Trigger node lookup and public endpoint composition.

use flowpush_protocol::{Node, WEBHOOK_PREFIX, WorkflowDefinition};
use serde::Serialize;
use url::Url;

/// Default path used when a trigger node has no `path` parameter.
pub const DEFAULT_TRIGGER_PATH: &str = "trigger";

/// Which nodes count as triggers and how their public URL is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRule {
	/// Accepted node kinds. A kind matches when it equals an entry or ends with `.{entry}`.
	pub trigger_types: Vec<String>,
	pub default_path: String,
	/// Path segment between the base URL and the node path.
	pub prefix: String,
}

impl Default for EndpointRule {
	fn default() -> Self {
		Self {
			trigger_types: vec!["webhook".to_string()],
			default_path: DEFAULT_TRIGGER_PATH.to_string(),
			prefix: WEBHOOK_PREFIX.to_string(),
		}
	}
}

/// Resolved public endpoint of a trigger node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerEndpoint {
	/// Node id, or its name when the id is absent.
	pub node: Option<String>,
	pub path: String,
	pub url: String,
	/// True when the node had no `path` and the default was used.
	pub defaulted: bool,
}

impl EndpointRule {
	pub fn is_trigger(&self, kind: &str) -> bool {
		self.trigger_types.iter().any(|wanted| {
			kind == wanted
				|| kind
					.strip_suffix(wanted.as_str())
					.is_some_and(|head| head.ends_with('.'))
		})
	}

	/// First trigger node in definition order.
	pub fn find_trigger<'d>(&self, definition: &'d WorkflowDefinition) -> Option<&'d Node> {
		definition.nodes.iter().find(|node| self.is_trigger(&node.kind))
	}

	/// Composes `{base}/{prefix}/{path}` for the first trigger node, if any.
	pub fn endpoint(&self, base_url: &Url, definition: &WorkflowDefinition) -> Option<TriggerEndpoint> {
		let node = self.find_trigger(definition)?;

		let configured = node.parameter_str("path").map(|p| p.trim().trim_matches('/')).filter(|p| !p.is_empty());
		let path = configured.unwrap_or(self.default_path.trim_matches('/')).to_string();

		let mut url = base_url.as_str().trim_end_matches('/').to_string();
		for segment in [self.prefix.trim_matches('/'), path.as_str()] {
			if !segment.is_empty() {
				url.push('/');
				url.push_str(segment);
			}
		}

		Some(TriggerEndpoint {
			node: node.id.clone().or_else(|| node.name.clone()),
			path,
			url,
			defaulted: configured.is_none(),
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn definition(nodes: serde_json::Value) -> WorkflowDefinition {
		serde_json::from_value(json!({ "name": "t", "nodes": nodes })).unwrap()
	}

	fn base() -> Url {
		Url::parse("https://flows.example.com/").unwrap()
	}

	#[test]
	fn kind_matching_accepts_namespaced_types() {
		let rule = EndpointRule::default();
		assert!(rule.is_trigger("webhook"));
		assert!(rule.is_trigger("trigger.webhook"));
		assert!(rule.is_trigger("@n8n/n8n-nodes-base.webhook"));
		assert!(!rule.is_trigger("n8n-nodes-base.notawebhook"));
		assert!(!rule.is_trigger("n8n-nodes-base.httpRequest"));
	}

	#[test]
	fn composes_endpoint_from_path_parameter() {
		let def = definition(json!([
			{ "id": "n0", "type": "n8n-nodes-base.set" },
			{ "id": "n1", "type": "trigger.webhook", "parameters": { "path": "/generate" } }
		]));

		let endpoint = EndpointRule::default().endpoint(&base(), &def).unwrap();
		assert_eq!(endpoint.url, "https://flows.example.com/webhook/generate");
		assert_eq!(endpoint.node.as_deref(), Some("n1"));
		assert!(!endpoint.defaulted);
	}

	#[test]
	fn missing_path_falls_back_to_default() {
		let def = definition(json!([{ "name": "Hook", "type": "webhook", "parameters": { "path": "  " } }]));

		let rule = EndpointRule {
			default_path: "generate-ugc-content".into(),
			..EndpointRule::default()
		};
		let endpoint = rule.endpoint(&base(), &def).unwrap();
		assert_eq!(endpoint.url, "https://flows.example.com/webhook/generate-ugc-content");
		assert_eq!(endpoint.node.as_deref(), Some("Hook"));
		assert!(endpoint.defaulted);
	}

	#[test]
	fn first_trigger_in_definition_order_wins() {
		let def = definition(json!([
			{ "id": "a", "type": "webhook", "parameters": { "path": "first" } },
			{ "id": "b", "type": "webhook", "parameters": { "path": "second" } }
		]));

		let endpoint = EndpointRule::default().endpoint(&base(), &def).unwrap();
		assert_eq!(endpoint.path, "first");
	}

	#[test]
	fn find_trigger_skips_non_trigger_nodes() {
		let def = definition(json!([
			{ "id": "set", "type": "n8n-nodes-base.set" },
			{ "id": "hook", "type": "n8n-nodes-base.webhook" }
		]));

		let rule = EndpointRule::default();
		let node = rule.find_trigger(&def).unwrap();
		assert_eq!(node.id.as_deref(), Some("hook"));
	}

	#[test]
	fn no_trigger_yields_no_endpoint() {
		let def = definition(json!([{ "type": "n8n-nodes-base.httpRequest" }]));
		assert!(EndpointRule::default().endpoint(&base(), &def).is_none());
	}

	#[test]
	fn base_path_and_custom_prefix_are_kept() {
		let def = definition(json!([{ "type": "formTrigger", "parameters": { "path": "signup" } }]));
		let rule = EndpointRule {
			trigger_types: vec!["formTrigger".into()],
			prefix: "form".into(),
			..EndpointRule::default()
		};

		let base = Url::parse("http://localhost:5678/n8n").unwrap();
		let endpoint = rule.endpoint(&base, &def).unwrap();
		assert_eq!(endpoint.url, "http://localhost:5678/n8n/form/signup");
	}
}
