//! Request and response bodies for the workflow service REST API.
//!
//! The service exposes a small session-authenticated surface:
//!
//! 1. `POST /rest/login` with [`LoginRequest`] establishes a cookie session
//! 2. `GET /rest/workflows` lists workflows ([`WorkflowListing`]) and doubles as a liveness probe
//! 3. `GET|PUT|PATCH /rest/workflows/{id}` fetches, replaces or patches ([`ActivationPatch`]) one workflow
//!
//! Activated workflows expose their trigger nodes under [`WEBHOOK_PREFIX`].

use serde::{Deserialize, Serialize};

/// Login endpoint; `GET` probes the current session, `POST` exchanges credentials.
pub const LOGIN_PATH: &str = "/rest/login";

/// Workflow collection endpoint.
pub const WORKFLOWS_PATH: &str = "/rest/workflows";

/// Default public path segment for production trigger endpoints.
pub const WEBHOOK_PREFIX: &str = "webhook";

/// Path of a single workflow resource.
pub fn workflow_path(id: &str) -> String {
	format!("{WORKFLOWS_PATH}/{id}")
}

/// Body of the credential login call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

/// Body of the activation patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationPatch {
	pub active: bool,
}

impl ActivationPatch {
	pub const ACTIVATE: Self = Self { active: true };
}

/// Minimal view of a workflow as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
	pub id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub active: bool,
}

/// Listing response. Depending on the service version the array is either
/// returned bare or wrapped in a `{ "data": [...] }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowListing {
	Envelope { data: Vec<WorkflowSummary> },
	Bare(Vec<WorkflowSummary>),
}

impl WorkflowListing {
	pub fn into_workflows(self) -> Vec<WorkflowSummary> {
		match self {
			WorkflowListing::Envelope { data } => data,
			WorkflowListing::Bare(items) => items,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn workflow_path_appends_id() {
		assert_eq!(workflow_path("09Np1CGn"), "/rest/workflows/09Np1CGn");
	}

	#[test]
	fn activation_patch_serializes_flag_only() {
		let body = serde_json::to_value(ActivationPatch::ACTIVATE).unwrap();
		assert_eq!(body, json!({ "active": true }));
	}

	#[test]
	fn listing_accepts_data_envelope() {
		let listing: WorkflowListing = serde_json::from_value(json!({
			"data": [{ "id": "a", "name": "First", "active": true }],
			"nextCursor": null
		}))
		.unwrap();

		let items = listing.into_workflows();
		assert_eq!(items.len(), 1);
		assert!(items[0].active);
	}

	#[test]
	fn listing_accepts_bare_array() {
		let listing: WorkflowListing = serde_json::from_value(json!([{ "id": "a" }, { "id": "b", "name": "Second" }])).unwrap();

		let items = listing.into_workflows();
		assert_eq!(items[1].name, "Second");
		assert!(!items[0].active);
	}
}
