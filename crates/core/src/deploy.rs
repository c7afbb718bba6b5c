//! Deployment pipeline.
//!
//! [`Deployer::run`] walks a fixed sequence of stages:
//!
//! 1. access check against the workflow listing
//! 2. load the local definition
//! 3. substitute secret placeholders
//! 4. probe the remote copy (informational)
//! 5. push the definition, inactive
//! 6. activate
//! 7. derive the public trigger endpoint
//! 8. send one synthetic request to that endpoint
//!
//! Stages 1, 2, 3 and 5 halt the run with a [`DeployHalt`]. Activation and
//! verification problems become [`Warning`]s and only affect the final
//! [`DeployStatus`]. Nothing is retried and a pushed definition is never rolled
//! back.

use std::fmt;
use std::path::PathBuf;

use flowpush_protocol::{WORKFLOWS_PATH, WorkflowDefinition};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{RemoteWorkflow, WorkflowApi};
use crate::definition;
use crate::error::Error;
use crate::http::{HttpClient, Method, ResponseBody, Session};
use crate::placeholder::{Secrets, substitute};
use crate::session::SessionManager;
use crate::trigger::{EndpointRule, TriggerEndpoint};

/// Top-level fields that only matter to the local editor.
pub const LOCAL_ONLY_FIELDS: [&str; 2] = ["meta", "pinData"];

/// Synthetic request body sent to the trigger endpoint unless configured otherwise.
pub fn default_verification_payload() -> Value {
	json!({
		"brandName": "Flowpush Verification",
		"industry": "Technology",
		"targetAudience": "Developers",
		"campaignGoal": "Deployment check",
		"platforms": ["web"],
		"stylePreferences": "minimal"
	})
}

/// Inputs of one deployment run.
#[derive(Debug, Clone)]
pub struct DeployPlan {
	/// Remote id to update. Falls back to the definition's own `id`.
	pub workflow_id: Option<String>,
	pub definition_path: PathBuf,
	pub endpoint_rule: EndpointRule,
	/// Top-level fields stripped from the push payload.
	pub local_only_fields: Vec<String>,
	pub verification_payload: Value,
	pub skip_verify: bool,
}

impl DeployPlan {
	pub fn new(definition_path: impl Into<PathBuf>) -> Self {
		Self {
			workflow_id: None,
			definition_path: definition_path.into(),
			endpoint_rule: EndpointRule::default(),
			local_only_fields: LOCAL_ONLY_FIELDS.iter().map(|f| f.to_string()).collect(),
			verification_payload: default_verification_payload(),
			skip_verify: false,
		}
	}

	pub fn with_workflow_id(mut self, id: impl Into<String>) -> Self {
		self.workflow_id = Some(id.into());
		self
	}
}

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Access,
	Load,
	Substitute,
	Probe,
	Push,
	Activate,
	Endpoint,
	Verify,
}

impl Stage {
	pub fn label(self) -> &'static str {
		match self {
			Stage::Access => "access check",
			Stage::Load => "load definition",
			Stage::Substitute => "substitute secrets",
			Stage::Probe => "remote probe",
			Stage::Push => "push",
			Stage::Activate => "activate",
			Stage::Endpoint => "trigger endpoint",
			Stage::Verify => "verification",
		}
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
	Passed,
	Warned,
	Skipped,
	Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
	pub stage: Stage,
	pub outcome: StageOutcome,
	pub detail: String,
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployStatus {
	DeployedActive,
	DeployedInactive,
	Failed,
}

impl DeployStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			DeployStatus::DeployedActive => "deployed-active",
			DeployStatus::DeployedInactive => "deployed-inactive",
			DeployStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for DeployStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Non-fatal problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
	/// Activation patch failed; the workflow stays deployed but inactive.
	Activation {
		status: Option<u16>,
		reason: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		body: Option<ResponseBody>,
	},
	/// Synthetic trigger call did not answer `200`/`201`.
	Verification {
		status: Option<u16>,
		reason: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		body: Option<ResponseBody>,
	},
}

impl fmt::Display for Warning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Warning::Activation { reason, .. } => write!(f, "activation: {reason}"),
			Warning::Verification { reason, .. } => write!(f, "verification: {reason}"),
		}
	}
}

/// Result of the verification stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
	Passed { status: u16 },
	Failed { reason: String },
	Skipped { reason: String },
}

/// Summary of one run. Built fresh per run and not mutated after it returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
	pub workflow_id: Option<String>,
	pub name: Option<String>,
	pub status: DeployStatus,
	pub endpoint: Option<TriggerEndpoint>,
	pub secrets_applied: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub secrets_unresolved: Vec<String>,
	/// Whether the remote copy existed before the push; `None` if the probe failed.
	pub remote_existed: Option<bool>,
	pub verification: Option<Verification>,
	pub warnings: Vec<Warning>,
	pub stages: Vec<StageReport>,
}

impl DeploymentResult {
	fn new() -> Self {
		Self {
			workflow_id: None,
			name: None,
			status: DeployStatus::Failed,
			endpoint: None,
			secrets_applied: Vec::new(),
			secrets_unresolved: Vec::new(),
			remote_existed: None,
			verification: None,
			warnings: Vec::new(),
			stages: Vec::new(),
		}
	}

	/// Endpoint URL, or `"not available"` when no trigger node was found.
	pub fn endpoint_display(&self) -> &str {
		self.endpoint.as_ref().map_or("not available", |e| e.url.as_str())
	}

	pub fn is_deployed(&self) -> bool {
		self.status != DeployStatus::Failed
	}

	fn record(&mut self, stage: Stage, outcome: StageOutcome, detail: impl Into<String>) {
		let detail = detail.into();
		match outcome {
			StageOutcome::Failed | StageOutcome::Warned => warn!(%stage, ?outcome, %detail),
			_ => info!(%stage, ?outcome, %detail),
		}
		self.stages.push(StageReport { stage, outcome, detail });
	}
}

/// A fatal stage failure, carrying the partial report.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct DeployHalt {
	pub stage: Stage,
	#[source]
	pub error: Error,
	pub report: Box<DeploymentResult>,
}

/// Runs a [`DeployPlan`] against one service.
#[derive(Debug, Clone, Copy)]
pub struct Deployer<'a> {
	client: &'a HttpClient,
	plan: &'a DeployPlan,
}

impl<'a> Deployer<'a> {
	pub fn new(client: &'a HttpClient, plan: &'a DeployPlan) -> Self {
		Self { client, plan }
	}

	/// Runs every stage in order, stopping at the first fatal one.
	///
	/// `session` must already hold whatever credentials should be used; this
	/// only checks them.
	pub async fn run(&self, session: &mut Session, secrets: &Secrets) -> Result<DeploymentResult, DeployHalt> {
		let mut report = DeploymentResult::new();
		let api = WorkflowApi::new(self.client);

		// 1. Access
		let access = SessionManager::new(self.client).with_probe(WORKFLOWS_PATH);
		match access.test_existing(session).await {
			Ok(true) => report.record(Stage::Access, StageOutcome::Passed, format!("authenticated ({:?})", session.mode())),
			Ok(false) => {
				let error = Error::Authentication("the service rejected the current session".into());
				return Err(halt(report, Stage::Access, error));
			}
			Err(error) => return Err(halt(report, Stage::Access, error)),
		}

		// 2. Load
		let loaded = match definition::load(&self.plan.definition_path) {
			Ok(def) => def,
			Err(error) => return Err(halt(report, Stage::Load, error)),
		};
		let Some(workflow_id) = self.plan.workflow_id.clone().or_else(|| loaded.id.clone()) else {
			let error = Error::Validation {
				path: self.plan.definition_path.clone(),
				reason: "no workflow id configured and the definition has none".into(),
			};
			return Err(halt(report, Stage::Load, error));
		};
		report.workflow_id = Some(workflow_id.clone());
		report.name = Some(loaded.name.clone());
		report.record(
			Stage::Load,
			StageOutcome::Passed,
			format!("{} ({} nodes) from {}", loaded.name, loaded.nodes.len(), self.plan.definition_path.display()),
		);

		// 3. Substitute
		let substitution = match substitute(&loaded, secrets) {
			Ok(s) => s,
			Err(error) => return Err(halt(report, Stage::Substitute, error)),
		};
		let detail = match substitution.unresolved.as_slice() {
			[] => format!("{} secret(s) applied", substitution.applied.len()),
			unresolved => format!(
				"{} secret(s) applied, left unresolved: {}",
				substitution.applied.len(),
				unresolved.join(", ")
			),
		};
		report.record(Stage::Substitute, StageOutcome::Passed, detail);
		report.secrets_applied = substitution.applied;
		report.secrets_unresolved = substitution.unresolved;
		let definition = substitution.definition;

		// 4. Probe
		match api.fetch(session, &workflow_id).await {
			Ok(RemoteWorkflow::Found { summary }) => {
				report.remote_existed = Some(true);
				let detail = match summary {
					Some(remote) if remote.active => "remote workflow exists (active)",
					Some(_) => "remote workflow exists (inactive)",
					None => "remote workflow exists",
				};
				report.record(Stage::Probe, StageOutcome::Passed, detail);
			}
			Ok(RemoteWorkflow::Missing) => {
				report.remote_existed = Some(false);
				report.record(Stage::Probe, StageOutcome::Warned, "remote workflow not found");
			}
			Err(error) => report.record(Stage::Probe, StageOutcome::Warned, error.to_string()),
		}

		// 5. Push
		let payload = match push_payload(&definition, &workflow_id, &self.plan.local_only_fields) {
			Ok(payload) => payload,
			Err(error) => return Err(halt(report, Stage::Push, error)),
		};
		match api.push(session, &workflow_id, &payload).await {
			Ok(response) if response.is_ok() => {
				report.record(Stage::Push, StageOutcome::Passed, format!("pushed {workflow_id} inactive"));
			}
			Ok(response) => {
				let error = Error::Deployment {
					status: response.status,
					body: response.body,
				};
				return Err(halt(report, Stage::Push, error));
			}
			Err(error) => return Err(halt(report, Stage::Push, error)),
		}

		// 6. Activate
		match self.activate(&api, session, &workflow_id).await {
			None => {
				report.status = DeployStatus::DeployedActive;
				report.record(Stage::Activate, StageOutcome::Passed, "workflow is active");
			}
			Some(warning) => {
				report.status = DeployStatus::DeployedInactive;
				report.record(Stage::Activate, StageOutcome::Warned, warning.to_string());
				report.warnings.push(warning);
			}
		}

		// 7. Endpoint
		report.endpoint = self.plan.endpoint_rule.endpoint(self.client.base_url(), &definition);
		match &report.endpoint {
			Some(endpoint) => {
				let detail = if endpoint.defaulted {
					format!("{} (default path)", endpoint.url)
				} else {
					endpoint.url.clone()
				};
				report.record(Stage::Endpoint, StageOutcome::Passed, detail);
			}
			None => report.record(Stage::Endpoint, StageOutcome::Skipped, "no trigger node; endpoint not available"),
		}

		// 8. Verify
		let (verification, warning) = self.verify(session, report.endpoint.as_ref()).await;
		match &verification {
			Verification::Passed { status } => {
				report.record(Stage::Verify, StageOutcome::Passed, format!("trigger answered {status}"));
			}
			Verification::Skipped { reason } => report.record(Stage::Verify, StageOutcome::Skipped, reason.clone()),
			Verification::Failed { reason } => report.record(Stage::Verify, StageOutcome::Warned, reason.clone()),
		}
		report.verification = Some(verification);
		report.warnings.extend(warning);

		info!(
			workflow_id = %workflow_id,
			status = %report.status,
			endpoint = report.endpoint_display(),
			"deployment finished"
		);
		Ok(report)
	}

	/// Transport failures are downgraded to a warning like any other refusal.
	async fn activate(&self, api: &WorkflowApi<'_>, session: &mut Session, workflow_id: &str) -> Option<Warning> {
		match api.activate(session, workflow_id).await {
			Ok(response) if response.is_ok() => None,
			Ok(response) => Some(Warning::Activation {
				status: Some(response.status),
				reason: format!("activation returned status {}", response.status),
				body: Some(response.body),
			}),
			Err(error) => Some(Warning::Activation {
				status: None,
				reason: error.to_string(),
				body: None,
			}),
		}
	}

	async fn verify(&self, session: &mut Session, endpoint: Option<&TriggerEndpoint>) -> (Verification, Option<Warning>) {
		let Some(endpoint) = endpoint else {
			let reason = "no trigger endpoint".to_string();
			return (Verification::Skipped { reason }, None);
		};
		if self.plan.skip_verify {
			let reason = "verification disabled".to_string();
			return (Verification::Skipped { reason }, None);
		}

		let sent = self
			.client
			.request(session, Method::POST, &endpoint.url, Some(&self.plan.verification_payload))
			.await;
		let warning = match sent {
			Ok(response) if matches!(response.status, 200 | 201) => {
				return (Verification::Passed { status: response.status }, None);
			}
			Ok(response) => Warning::Verification {
				status: Some(response.status),
				reason: format!("trigger answered {}: {}", response.status, response.body.preview(200)),
				body: Some(response.body),
			},
			Err(error) => Warning::Verification {
				status: None,
				reason: error.to_string(),
				body: None,
			},
		};
		let reason = match &warning {
			Warning::Verification { reason, .. } | Warning::Activation { reason, .. } => reason.clone(),
		};
		(Verification::Failed { reason }, Some(warning))
	}
}

/// Builds the push body: `id` forced to `workflow_id`, `active` forced off, local-only fields dropped.
pub fn push_payload(definition: &WorkflowDefinition, workflow_id: &str, local_only_fields: &[String]) -> crate::Result<Value> {
	let mut definition = definition.clone();
	definition.id = Some(workflow_id.to_string());
	definition.active = false;
	for field in local_only_fields {
		definition.remove_field(field);
	}
	Ok(serde_json::to_value(definition)?)
}

fn halt(mut report: DeploymentResult, stage: Stage, error: Error) -> DeployHalt {
	report.status = DeployStatus::Failed;
	report.record(stage, StageOutcome::Failed, error.to_string());
	DeployHalt {
		stage,
		error,
		report: Box::new(report),
	}
}
