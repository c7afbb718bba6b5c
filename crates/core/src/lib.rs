//! flowpush: deploy workflow definitions to a remote automation service.
//!
//! The crate authenticates against the service, loads a local definition,
//! resolves secret placeholders, pushes and activates the workflow and checks
//! its public trigger endpoint with one synthetic request.
//!
//! # Example
//!
//! ```ignore
//! use flowpush::{DeployPlan, Deployer, HttpClient, Secrets, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new("https://flows.example.com", None)?;
//!     let mut session = Session::with_token(std::env::var("FLOWPUSH_API_TOKEN")?);
//!     let secrets = Secrets::from_env(["GEMINI_API_KEY"]);
//!
//!     let plan = DeployPlan::new("workflow.json").with_workflow_id("09Np1CGnBkmnVZSi");
//!     let result = Deployer::new(&client, &plan).run(&mut session, &secrets).await?;
//!     println!("{} at {}", result.status, result.endpoint_display());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod definition;
pub mod deploy;
pub mod error;
pub mod http;
pub mod placeholder;
pub mod session;
pub mod trigger;

pub use api::{RemoteWorkflow, WorkflowApi};
pub use deploy::{
	DeployHalt, DeployPlan, DeployStatus, Deployer, DeploymentResult, Stage, StageOutcome, StageReport, Verification, Warning,
	default_verification_payload,
};
pub use error::{Error, Result};
pub use flowpush_protocol as protocol;
pub use http::{AuthMode, HttpClient, HttpResponse, Method, ResponseBody, Session};
pub use placeholder::{Secrets, Substitution, substitute};
pub use session::{AuthMethod, CredentialProvider, Credentials, SessionManager};
pub use trigger::{EndpointRule, TriggerEndpoint};
