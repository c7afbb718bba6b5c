//! Wire types shared between the flowpush library and CLI.
//!
//! # Main Types
//!
//! - [`WorkflowDefinition`] - A workflow as stored locally and on the remote service
//! - [`Node`] - One step of a workflow definition
//! - [`LoginRequest`] / [`ActivationPatch`] - Request bodies for the REST API
//! - [`WorkflowListing`] - Response of the workflow listing endpoint

mod rest;
mod workflow;

pub use rest::{
	ActivationPatch, LOGIN_PATH, LoginRequest, WEBHOOK_PREFIX, WORKFLOWS_PATH, WorkflowListing, WorkflowSummary, workflow_path,
};
pub use workflow::{Node, WorkflowDefinition};
