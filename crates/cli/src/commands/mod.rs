mod auth;
mod deploy;

use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::output::OutputFormat;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
	pub config: Option<PathBuf>,
	pub base_url: Option<String>,
	pub format: OutputFormat,
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let global = GlobalOpts {
		config: cli.config,
		base_url: cli.base_url,
		format: cli.format,
	};

	match cli.command.unwrap_or_else(|| Commands::Deploy(Default::default())) {
		Commands::Deploy(args) => deploy::execute(args, &global).await,
		Commands::Auth(args) => auth::execute(args, &global).await,
	}
}
