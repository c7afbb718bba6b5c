//! Runs the `flowpush` binary against a mock workflow service.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use mockito::Server;
use serde_json::{Value, json};
use tempfile::TempDir;

const WORKFLOW_ID: &str = "wf-123";

fn flowpush_binary() -> PathBuf {
	let mut path = std::env::current_exe().unwrap();
	path.pop();
	path.pop();
	path.push("flowpush");
	path
}

/// Runs in `dir` with no inherited configuration.
fn run(dir: &Path, args: &[&str]) -> (Output, Value) {
	let output = Command::new(flowpush_binary())
		.current_dir(dir)
		.env("XDG_CONFIG_HOME", dir.join("xdg"))
		.env_remove("FLOWPUSH_BASE_URL")
		.env_remove("FLOWPUSH_WORKFLOW_ID")
		.env_remove("FLOWPUSH_API_TOKEN")
		.env_remove("RUST_LOG")
		.args(["-f", "json"])
		.args(args)
		.output()
		.expect("failed to execute flowpush");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let parsed = serde_json::from_str::<Value>(&stdout).unwrap_or_else(|_| json!({ "raw": stdout }));
	(output, parsed)
}

#[test]
fn missing_base_url_is_a_config_error() {
	let dir = TempDir::new().unwrap();
	let (output, json) = run(dir.path(), &["deploy", "--token", "tok"]);

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["ok"], false);
	assert_eq!(json["command"], "deploy");
	assert_eq!(json["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn malformed_definition_fails_validation_without_pushing() {
	let mut server = Server::new();
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("workflow.json"), "{ not json").unwrap();

	let listing = server
		.mock("GET", "/rest/workflows")
		.match_header("authorization", "Bearer tok")
		.with_status(200)
		.with_body(r#"{"data":[]}"#)
		.expect_at_least(1)
		.create();
	let push = server.mock("PUT", mockito::Matcher::Any).expect(0).create();

	let url = server.url();
	let (output, json) = run(dir.path(), &["--base-url", &url, "deploy", "--workflow-id", WORKFLOW_ID, "--token", "tok"]);

	assert_eq!(output.status.code(), Some(1));
	assert_eq!(json["ok"], false);
	assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
	assert_eq!(json["error"]["details"]["stage"], "load");
	listing.assert();
	push.assert();
}

#[test]
fn project_config_drives_a_full_deploy() {
	let mut server = Server::new();
	let dir = TempDir::new().unwrap();
	let definition = json!({
		"name": "UGC",
		"nodes": [{ "id": "n1", "type": "n8n-nodes-base.webhook", "parameters": { "path": "generate" } }]
	});
	std::fs::write(dir.path().join("flow.json"), definition.to_string()).unwrap();
	std::fs::write(
		dir.path().join("flowpush.json"),
		json!({ "baseUrl": server.url(), "workflowId": WORKFLOW_ID, "workflowFile": "flow.json" }).to_string(),
	)
	.unwrap();

	let path = format!("/rest/workflows/{WORKFLOW_ID}");
	server.mock("GET", "/rest/workflows").with_status(200).with_body("[]").create();
	server.mock("GET", path.as_str()).with_status(404).create();
	let push = server.mock("PUT", path.as_str()).with_status(200).with_body("{}").create();
	server.mock("PATCH", path.as_str()).with_status(200).with_body("{}").create();
	let trigger = server.mock("POST", "/webhook/generate").with_status(200).with_body("{}").create();

	let (output, json) = run(dir.path(), &["deploy", "--token", "tok"]);

	assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	assert_eq!(json["ok"], true);
	assert_eq!(json["data"]["status"], "deployed-active");
	assert_eq!(json["data"]["workflowId"], WORKFLOW_ID);
	assert_eq!(json["data"]["endpoint"]["url"], format!("{}/webhook/generate", server.url()));
	push.assert();
	trigger.assert();
}
