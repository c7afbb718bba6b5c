//! Terminal prompts for interactive authentication.

use std::io::{self, Write};

use async_trait::async_trait;
use flowpush::{CredentialProvider, Credentials};

/// Menu entry picked at the authentication prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
	Token,
	Password,
	Abort,
}

impl Choice {
	/// Anything other than `1` or `2` aborts.
	pub fn parse(input: &str) -> Self {
		match input.trim() {
			"1" => Choice::Token,
			"2" => Choice::Password,
			_ => Choice::Abort,
		}
	}
}

/// Prints `prompt` to stderr and reads one trimmed line from stdin on a blocking task.
///
/// End of input reads as an empty line.
pub async fn read_line(prompt: &str) -> io::Result<String> {
	{
		let mut stderr = io::stderr().lock();
		write!(stderr, "{prompt}")?;
		stderr.flush()?;
	}

	tokio::task::spawn_blocking(|| -> io::Result<String> {
		let mut input = String::new();
		io::stdin().read_line(&mut input)?;
		Ok(input.trim().to_string())
	})
	.await
	.map_err(io::Error::other)?
}

/// Asks the user on the terminal how to authenticate.
#[derive(Debug, Clone, Default)]
pub struct TerminalCredentialProvider {
	default_email: Option<String>,
}

impl TerminalCredentialProvider {
	pub fn new(default_email: Option<String>) -> Self {
		Self { default_email }
	}

	async fn ask_email(&self) -> io::Result<String> {
		let prompt = match &self.default_email {
			Some(email) => format!("Email [{email}]: "),
			None => "Email: ".to_string(),
		};
		let email = read_line(&prompt).await?;
		Ok(match (&self.default_email, email.is_empty()) {
			(Some(default), true) => default.clone(),
			_ => email,
		})
	}
}

#[async_trait]
impl CredentialProvider for TerminalCredentialProvider {
	async fn choose(&mut self) -> flowpush::Result<Option<Credentials>> {
		eprintln!();
		eprintln!("Authentication required. Choose a method:");
		eprintln!("  1) API token");
		eprintln!("  2) Email and password");
		eprintln!("  3) Abort");

		match Choice::parse(&read_line("Choice [1-3]: ").await?) {
			Choice::Token => {
				let token = read_line("API token: ").await?;
				Ok((!token.is_empty()).then_some(Credentials::Token(token)))
			}
			Choice::Password => {
				let email = self.ask_email().await?;
				// Input is echoed; nothing is stored after the exchange.
				let password = read_line("Password: ").await?;
				if email.is_empty() || password.is_empty() {
					return Ok(None);
				}
				Ok(Some(Credentials::Password { email, password }))
			}
			Choice::Abort => Ok(None),
		}
	}
}
