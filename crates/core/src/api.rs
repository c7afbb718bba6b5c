//! Typed calls against the workflow REST API.

use flowpush_protocol::{ActivationPatch, WORKFLOWS_PATH, WorkflowListing, WorkflowSummary, workflow_path};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpResponse, Method, Session};

/// Result of looking up one workflow by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWorkflow {
	Missing,
	/// The service answered `200`. `summary` is `None` when the body had an unfamiliar shape.
	Found { summary: Option<WorkflowSummary> },
}

/// Workflow endpoints bound to one client.
///
/// `push` and `activate` hand back the raw response; whether a non-200 status
/// is fatal is the caller's decision.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowApi<'a> {
	client: &'a HttpClient,
}

impl<'a> WorkflowApi<'a> {
	pub fn new(client: &'a HttpClient) -> Self {
		Self { client }
	}

	/// Lists all workflows visible to the session.
	pub async fn list(&self, session: &mut Session) -> Result<Vec<WorkflowSummary>> {
		let response = self.client.get(session, WORKFLOWS_PATH).await?;
		let response = expect_ok(response, WORKFLOWS_PATH)?;
		let listing: WorkflowListing = response.body.decode().ok_or_else(|| Error::UnexpectedBody {
			endpoint: WORKFLOWS_PATH.to_string(),
			body: response.body.clone(),
		})?;
		Ok(listing.into_workflows())
	}

	/// Looks up one workflow. Existence is decided by status alone.
	pub async fn fetch(&self, session: &mut Session, id: &str) -> Result<RemoteWorkflow> {
		let path = workflow_path(id);
		let response = self.client.get(session, &path).await?;
		if response.status == 404 {
			debug!(workflow_id = id, "workflow not found");
			return Ok(RemoteWorkflow::Missing);
		}
		let response = expect_ok(response, &path)?;

		// Newer service versions wrap single resources in `data`.
		let summary = response
			.body
			.as_json()
			.and_then(|value| value.get("data"))
			.and_then(|data| serde_json::from_value(data.clone()).ok())
			.or_else(|| response.body.decode());
		if summary.is_none() {
			debug!(workflow_id = id, body = %response.body.preview(200), "workflow exists but its summary did not decode");
		}
		Ok(RemoteWorkflow::Found { summary })
	}

	/// Replaces the remote definition of `id` with `payload`.
	pub async fn push(&self, session: &mut Session, id: &str, payload: &Value) -> Result<HttpResponse> {
		self.client.request(session, Method::PUT, &workflow_path(id), Some(payload)).await
	}

	/// Patches `id` to active.
	pub async fn activate(&self, session: &mut Session, id: &str) -> Result<HttpResponse> {
		let body = serde_json::to_value(ActivationPatch::ACTIVATE)?;
		self.client.request(session, Method::PATCH, &workflow_path(id), Some(&body)).await
	}
}

fn expect_ok(response: HttpResponse, endpoint: &str) -> Result<HttpResponse> {
	if response.is_ok() {
		return Ok(response);
	}
	Err(Error::UnexpectedStatus {
		endpoint: endpoint.to_string(),
		status: response.status,
		body: response.body,
	})
}

#[cfg(test)]
mod tests {
	use mockito::{Matcher, Server};
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn list_accepts_both_listing_shapes() {
		let mut server = Server::new_async().await;
		let client = HttpClient::new(&server.url(), None).unwrap();
		let api = WorkflowApi::new(&client);

		let envelope = server
			.mock("GET", "/rest/workflows")
			.with_status(200)
			.with_body(r#"{"data":[{"id":"a","name":"A","active":true}]}"#)
			.create_async()
			.await;
		let items = api.list(&mut Session::new()).await.unwrap();
		assert_eq!(items[0].id, "a");
		envelope.remove_async().await;

		server
			.mock("GET", "/rest/workflows")
			.with_status(200)
			.with_body(r#"[{"id":"b"},{"id":"c"}]"#)
			.create_async()
			.await;
		let items = api.list(&mut Session::new()).await.unwrap();
		assert_eq!(items.len(), 2);
	}

	#[tokio::test]
	async fn list_reports_status_on_rejection() {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/rest/workflows")
			.with_status(401)
			.with_body(r#"{"message":"Unauthorized"}"#)
			.create_async()
			.await;

		let client = HttpClient::new(&server.url(), None).unwrap();
		let err = WorkflowApi::new(&client).list(&mut Session::new()).await.unwrap_err();
		assert!(matches!(err, Error::UnexpectedStatus { status: 401, .. }), "{err}");
	}

	#[tokio::test]
	async fn fetch_unwraps_data_and_maps_404_to_none() {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/rest/workflows/w1")
			.with_status(200)
			.with_body(r#"{"data":{"id":"w1","name":"UGC","active":false,"nodes":[]}}"#)
			.create_async()
			.await;
		server.mock("GET", "/rest/workflows/gone").with_status(404).create_async().await;

		let client = HttpClient::new(&server.url(), None).unwrap();
		let api = WorkflowApi::new(&client);
		let mut session = Session::new();

		let RemoteWorkflow::Found { summary: Some(found) } = api.fetch(&mut session, "w1").await.unwrap() else {
			panic!("expected a decoded summary");
		};
		assert_eq!(found.name, "UGC");
		assert_eq!(api.fetch(&mut session, "gone").await.unwrap(), RemoteWorkflow::Missing);
	}

	#[tokio::test]
	async fn fetch_treats_any_200_as_existing() {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/rest/workflows/42")
			.with_status(200)
			.with_body(r#"{"data":{"id":42,"name":"UGC","active":true}}"#)
			.create_async()
			.await;
		server.mock("GET", "/rest/workflows/plain").with_status(200).with_body("ok").create_async().await;

		let client = HttpClient::new(&server.url(), None).unwrap();
		let api = WorkflowApi::new(&client);
		let mut session = Session::new();

		assert_eq!(api.fetch(&mut session, "42").await.unwrap(), RemoteWorkflow::Found { summary: None });
		assert_eq!(api.fetch(&mut session, "plain").await.unwrap(), RemoteWorkflow::Found { summary: None });
	}

	#[tokio::test]
	async fn list_reports_unrecognised_body() {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/rest/workflows")
			.with_status(200)
			.with_body(r#"{"workflows":"nope"}"#)
			.create_async()
			.await;

		let client = HttpClient::new(&server.url(), None).unwrap();
		let err = WorkflowApi::new(&client).list(&mut Session::new()).await.unwrap_err();
		assert!(matches!(err, Error::UnexpectedBody { .. }), "{err}");
		assert!(err.to_string().contains("/rest/workflows"));
	}

	#[tokio::test]
	async fn push_and_activate_use_put_and_patch() {
		let mut server = Server::new_async().await;
		let push = server
			.mock("PUT", "/rest/workflows/w1")
			.match_body(Matcher::PartialJson(json!({ "id": "w1", "active": false })))
			.with_status(200)
			.create_async()
			.await;
		let activate = server
			.mock("PATCH", "/rest/workflows/w1")
			.match_body(Matcher::Json(json!({ "active": true })))
			.with_status(400)
			.create_async()
			.await;

		let client = HttpClient::new(&server.url(), None).unwrap();
		let api = WorkflowApi::new(&client);
		let mut session = Session::new();

		let pushed = api
			.push(&mut session, "w1", &json!({ "id": "w1", "name": "UGC", "active": false, "nodes": [] }))
			.await
			.unwrap();
		assert!(pushed.is_ok());
		let activated = api.activate(&mut session, "w1").await.unwrap();
		assert_eq!(activated.status, 400);

		push.assert_async().await;
		activate.assert_async().await;
	}
}
