//! Human-readable staged log, written to stderr.

use colored::{ColoredString, Colorize};
use flowpush::{DeployHalt, DeployStatus, DeploymentResult, StageOutcome};

fn marker(outcome: StageOutcome) -> ColoredString {
	match outcome {
		StageOutcome::Passed => "✓".green().bold(),
		StageOutcome::Warned => "⚠".yellow().bold(),
		StageOutcome::Skipped => "-".dimmed(),
		StageOutcome::Failed => "✗".red().bold(),
	}
}

pub fn print_stage_log(report: &DeploymentResult) {
	for stage in &report.stages {
		eprintln!("{} {:<20} {}", marker(stage.outcome), stage.stage.label(), stage.detail);
	}
}

pub fn print_summary(report: &DeploymentResult) {
	let status = match report.status {
		DeployStatus::DeployedActive => report.status.as_str().green().bold(),
		DeployStatus::DeployedInactive => report.status.as_str().yellow().bold(),
		DeployStatus::Failed => report.status.as_str().red().bold(),
	};
	let applied = if report.secrets_applied.is_empty() {
		"none".to_string()
	} else {
		report.secrets_applied.join(", ")
	};

	eprintln!();
	eprintln!("{}", "Deployment summary".bold().underline());
	eprintln!("  workflow  {}", report.workflow_id.as_deref().unwrap_or("-"));
	eprintln!("  name      {}", report.name.as_deref().unwrap_or("-"));
	eprintln!("  status    {status}");
	eprintln!("  endpoint  {}", report.endpoint_display());
	eprintln!("  secrets   {applied}");
	for warning in &report.warnings {
		eprintln!("  {} {warning}", "warning".yellow());
	}
}

/// Names the failing stage and dumps the raw remote response, if any.
pub fn print_halt(halt: &DeployHalt) {
	eprintln!();
	eprintln!("{} halted at {}: {}", "✗".red().bold(), halt.stage.label().bold(), halt.error);
	if let Some(body) = halt.error.response_body() {
		eprintln!("  response: {}", body.preview(2000));
	}
}

/// Shows the first 8 and last 4 characters of a token.
pub fn mask_token(token: &str) -> String {
	let chars: Vec<char> = token.chars().collect();
	if chars.len() <= 12 {
		return "*".repeat(chars.len());
	}
	let head: String = chars[..8].iter().collect();
	let tail: String = chars[chars.len() - 4..].iter().collect();
	format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_tokens_keep_head_and_tail() {
		assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig9f2c"), "eyJhbGci...9f2c");
	}

	#[test]
	fn short_tokens_are_fully_masked() {
		assert_eq!(mask_token("abc123"), "******");
		assert_eq!(mask_token(""), "");
	}
}
