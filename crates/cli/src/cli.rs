use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Help colors in cargo's style: green bold headers, cyan literals.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "flowpush")]
#[command(about = "Deploy, activate and verify workflow definitions on a remote automation service")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), toon, json, or ndjson
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Configuration file (skips the global and project lookup)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Base URL of the workflow service
	#[arg(long, global = true, value_name = "URL")]
	pub base_url: Option<String>,

	#[command(subcommand)]
	pub command: Option<Commands>,
}

impl Cli {
	/// Command name used in the output envelope.
	pub fn command_name(&self) -> &'static str {
		match &self.command {
			None | Some(Commands::Deploy(_)) => "deploy",
			Some(Commands::Auth(args)) => match (&args.command, args.quick) {
				(Some(AuthCommand::Check { .. }), _) => "auth.check",
				(None, true) => "auth.quick",
				(None, false) => "auth",
			},
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run the full pipeline: authenticate, push, activate, verify (default)
	Deploy(DeployArgs),

	/// Establish or check a session with the workflow service
	Auth(AuthArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeployArgs {
	/// Workflow definition file
	#[arg(long, value_name = "PATH")]
	pub file: Option<PathBuf>,

	/// Remote workflow id to update
	#[arg(long, value_name = "ID")]
	pub workflow_id: Option<String>,

	/// API token; skips interactive authentication
	#[arg(long, value_name = "TOKEN")]
	pub token: Option<String>,

	/// Do not call the trigger endpoint after deploying
	#[arg(long)]
	pub skip_verify: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
	/// Only validate an API token and print a ready-to-use command
	#[arg(short, long)]
	pub quick: bool,

	/// API token to validate (quick mode)
	#[arg(long, value_name = "TOKEN")]
	pub token: Option<String>,

	#[command(subcommand)]
	pub command: Option<AuthCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
	/// Validate a token and report which workflows it can see
	Check {
		/// Token to check; falls back to FLOWPUSH_API_TOKEN
		token: Option<String>,
	},
}
