use std::time::Instant;

use flowpush::{Deployer, Session, SessionManager, Warning};
use tracing::info;

use super::GlobalOpts;
use crate::cli::DeployArgs;
use crate::config::{Overrides, Settings};
use crate::display;
use crate::error::Result;
use crate::output::{self, CommandInputs, ResultBuilder};
use crate::prompt::TerminalCredentialProvider;

pub async fn execute(args: DeployArgs, global: &GlobalOpts) -> Result<()> {
	let started = Instant::now();
	let overrides = Overrides {
		base_url: global.base_url.clone(),
		workflow_id: args.workflow_id,
		file: args.file,
		token: args.token,
	};
	let settings = Settings::load(global.config.as_deref(), overrides)?;
	let client = settings.client()?;
	let plan = settings.deploy_plan(args.skip_verify);

	let mut session = Session::new();
	let mut provider = TerminalCredentialProvider::new(settings.login_email.clone());
	let method = SessionManager::new(&client)
		.establish(&mut session, settings.api_token.as_deref(), &mut provider)
		.await?;
	info!(?method, base_url = %settings.base_url, "session established");

	let secrets = settings.secrets();
	let report = match Deployer::new(&client, &plan).run(&mut session, &secrets).await {
		Ok(report) => report,
		Err(halt) => {
			display::print_stage_log(&halt.report);
			display::print_halt(&halt);
			return Err(halt.into());
		}
	};
	display::print_stage_log(&report);
	display::print_summary(&report);

	let mut builder = ResultBuilder::new("deploy").started_at(started).inputs(CommandInputs {
		base_url: Some(settings.base_url.clone()),
		workflow_id: report.workflow_id.clone(),
		file: Some(plan.definition_path.clone()),
	});
	if !report.secrets_applied.is_empty() {
		builder = builder.info(format!("{} secret(s) applied", report.secrets_applied.len()));
	}
	for warning in &report.warnings {
		let source = match warning {
			Warning::Activation { .. } => "activate",
			Warning::Verification { .. } => "verify",
		};
		builder = builder.warning(source, warning.to_string());
	}
	for name in &report.secrets_unresolved {
		builder = builder.warning("substitute", format!("no value for {name}; placeholder left as written"));
	}

	output::print_result(&builder.data(report).build(), global.format);
	Ok(())
}
