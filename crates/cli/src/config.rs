//! Configuration loading.
//!
//! Values are layered, later sources winning:
//!
//! 1. global file `$XDG_CONFIG_HOME/flowpush/config.json`
//! 2. project file `./flowpush.json`
//! 3. environment (`FLOWPUSH_BASE_URL`, `FLOWPUSH_WORKFLOW_ID`, `FLOWPUSH_API_TOKEN`)
//! 4. command-line flags
//!
//! An explicit `--config FILE` replaces both files and must exist.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowpush::{DeployPlan, EndpointRule, HttpClient, Secrets};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{CliError, Result};

pub const ENV_BASE_URL: &str = "FLOWPUSH_BASE_URL";
pub const ENV_WORKFLOW_ID: &str = "FLOWPUSH_WORKFLOW_ID";
pub const ENV_API_TOKEN: &str = "FLOWPUSH_API_TOKEN";

const DEFAULT_WORKFLOW_FILE: &str = "workflow.json";
const PROJECT_FILE: &str = "flowpush.json";

/// On-disk configuration. Every field is optional so files can be merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub workflow_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub workflow_file: Option<PathBuf>,
	/// Names of secrets read from the environment and substituted into the definition.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secrets: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trigger_types: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_webhook_path: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub webhook_prefix: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub local_only_fields: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub verification_payload: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub login_email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
}

impl FileConfig {
	/// Overlays every field set in `other`.
	pub fn merge(&mut self, other: FileConfig) {
		macro_rules! overlay {
			($($field:ident),*) => {
				$(if other.$field.is_some() {
					self.$field = other.$field;
				})*
			};
		}
		overlay!(
			base_url,
			workflow_id,
			workflow_file,
			secrets,
			trigger_types,
			default_webhook_path,
			webhook_prefix,
			local_only_fields,
			verification_payload,
			login_email,
			timeout_secs
		);
	}
}

/// Locations of the implicit configuration files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
	pub global: Option<PathBuf>,
	pub project: PathBuf,
}

impl ConfigPaths {
	pub fn new(project_root: &Path) -> Self {
		let config_home = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from).or_else(dirs::config_dir);

		Self {
			global: config_home.map(|home| home.join("flowpush").join("config.json")),
			project: project_root.join(PROJECT_FILE),
		}
	}
}

/// Reads one file. `Ok(None)` when it does not exist.
pub fn load_file(path: &Path) -> Result<Option<FileConfig>> {
	let content = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(err.into()),
	};
	let config = serde_json::from_str(&content).map_err(|e| CliError::ConfigFile {
		path: path.to_path_buf(),
		reason: e.to_string(),
	})?;
	debug!(path = %path.display(), "configuration file loaded");
	Ok(Some(config))
}

/// Loads the explicit file, or merges the global and project files.
pub fn load(explicit: Option<&Path>, paths: &ConfigPaths) -> Result<FileConfig> {
	if let Some(path) = explicit {
		return load_file(path)?.ok_or_else(|| CliError::ConfigFile {
			path: path.to_path_buf(),
			reason: "file does not exist".into(),
		});
	}

	let mut config = match &paths.global {
		Some(global) => load_file(global)?.unwrap_or_default(),
		None => FileConfig::default(),
	};
	if let Some(project) = load_file(&paths.project)? {
		config.merge(project);
	}
	Ok(config)
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub base_url: Option<String>,
	pub workflow_id: Option<String>,
	pub file: Option<PathBuf>,
	pub token: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
	pub base_url: String,
	pub workflow_id: Option<String>,
	pub workflow_file: PathBuf,
	pub secret_names: Vec<String>,
	pub endpoint_rule: EndpointRule,
	pub local_only_fields: Option<Vec<String>>,
	pub verification_payload: Option<Value>,
	pub login_email: Option<String>,
	pub timeout: Option<Duration>,
	pub api_token: Option<String>,
}

impl Settings {
	/// Layers `env` and `overrides` over `file`. Fails when no base URL is known.
	pub fn resolve<F>(file: FileConfig, env: F, overrides: Overrides) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

		let base_url = overrides
			.base_url
			.or_else(|| lookup(ENV_BASE_URL))
			.or(file.base_url)
			.ok_or_else(|| CliError::Config(format!("no base URL configured; set `baseUrl`, {ENV_BASE_URL} or --base-url")))?;

		let defaults = EndpointRule::default();
		let endpoint_rule = EndpointRule {
			trigger_types: file.trigger_types.unwrap_or(defaults.trigger_types),
			default_path: file.default_webhook_path.unwrap_or(defaults.default_path),
			prefix: file.webhook_prefix.unwrap_or(defaults.prefix),
		};

		Ok(Self {
			base_url,
			workflow_id: overrides.workflow_id.or_else(|| lookup(ENV_WORKFLOW_ID)).or(file.workflow_id),
			workflow_file: overrides
				.file
				.or(file.workflow_file)
				.unwrap_or_else(|| PathBuf::from(DEFAULT_WORKFLOW_FILE)),
			secret_names: file.secrets.unwrap_or_default(),
			endpoint_rule,
			local_only_fields: file.local_only_fields,
			verification_payload: file.verification_payload,
			login_email: file.login_email,
			timeout: file.timeout_secs.map(Duration::from_secs),
			api_token: overrides.token.or_else(|| lookup(ENV_API_TOKEN)),
		})
	}

	/// Loads configuration files and resolves against the process environment.
	pub fn load(explicit: Option<&Path>, overrides: Overrides) -> Result<Self> {
		let cwd = std::env::current_dir()?;
		let file = load(explicit, &ConfigPaths::new(&cwd))?;
		Self::resolve(file, |key| std::env::var(key).ok(), overrides)
	}

	pub fn client(&self) -> Result<HttpClient> {
		Ok(HttpClient::new(&self.base_url, self.timeout)?)
	}

	/// Reads every configured secret from the environment, once.
	pub fn secrets(&self) -> Secrets {
		Secrets::from_env(&self.secret_names)
	}

	pub fn deploy_plan(&self, skip_verify: bool) -> DeployPlan {
		let mut plan = DeployPlan::new(&self.workflow_file);
		plan.workflow_id = self.workflow_id.clone();
		plan.endpoint_rule = self.endpoint_rule.clone();
		if let Some(fields) = &self.local_only_fields {
			plan.local_only_fields = fields.clone();
		}
		if let Some(payload) = &self.verification_payload {
			plan.verification_payload = payload.clone();
		}
		plan.skip_verify = skip_verify;
		plan
	}
}
