//! Session acquisition against the workflow service.
//!
//! A session is either a bearer token or a cookie jar obtained through a
//! credential login. [`SessionManager`] probes existing credentials and, when
//! none are valid, asks a [`CredentialProvider`] for new ones. Nothing is
//! retried and nothing is cached across runs.

use async_trait::async_trait;
use flowpush_protocol::{LOGIN_PATH, LoginRequest, WORKFLOWS_PATH};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::http::{HttpClient, Method, Session};

/// Credentials supplied by the user.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
	Token(String),
	Password { email: String, password: String },
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Credentials::Token(_) => f.write_str("Token(***)"),
			Credentials::Password { email, .. } => f.debug_struct("Password").field("email", email).finish_non_exhaustive(),
		}
	}
}

/// Source of credentials when no valid session exists.
///
/// Returning `Ok(None)` means the user aborted; callers must not attempt any
/// authenticated work afterwards.
#[async_trait]
pub trait CredentialProvider: Send {
	async fn choose(&mut self) -> Result<Option<Credentials>>;
}

/// How the active session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
	/// Credentials already held by the session were accepted by the probe.
	Existing,
	Token,
	Credentials,
}

/// Probes and acquires sessions through an [`HttpClient`].
#[derive(Debug, Clone, Copy)]
pub struct SessionManager<'a> {
	client: &'a HttpClient,
	probe: &'a str,
}

impl<'a> SessionManager<'a> {
	/// Creates a manager probing the login endpoint.
	pub fn new(client: &'a HttpClient) -> Self {
		Self { client, probe: LOGIN_PATH }
	}

	/// Uses another protected endpoint as the liveness probe.
	pub fn with_probe(mut self, endpoint: &'a str) -> Self {
		self.probe = endpoint;
		self
	}

	/// Checks whether `session` is accepted by the service.
	///
	/// Only `200` counts as authenticated. Unexpected statuses are logged with
	/// the raw response and treated as unauthenticated.
	pub async fn test_existing(&self, session: &mut Session) -> Result<bool> {
		let response = self.client.get(session, self.probe).await?;
		match response.status {
			200 => {
				info!(probe = self.probe, "session accepted");
				Ok(true)
			}
			401 => {
				info!(probe = self.probe, "authentication required");
				Ok(false)
			}
			status => {
				warn!(
					probe = self.probe,
					status,
					body = %response.body.preview(500),
					"unexpected probe response"
				);
				Ok(false)
			}
		}
	}

	/// Installs `token` and verifies it against the workflow listing.
	///
	/// The token is removed again unless the service answers `200`.
	pub async fn authenticate_with_token(&self, session: &mut Session, token: &str) -> Result<bool> {
		session.set_token(token);
		match self.client.get(session, WORKFLOWS_PATH).await {
			Ok(response) if response.is_ok() => {
				info!("token accepted");
				Ok(true)
			}
			Ok(response) => {
				warn!(status = response.status, "token rejected");
				session.clear_token();
				Ok(false)
			}
			Err(err) => {
				session.clear_token();
				Err(err)
			}
		}
	}

	/// Exchanges email and password for session cookies.
	pub async fn authenticate_with_credentials(&self, session: &mut Session, email: &str, password: &str) -> Result<bool> {
		let body = serde_json::to_value(LoginRequest {
			email: email.to_string(),
			password: password.to_string(),
		})?;
		let response = self.client.request(session, Method::POST, LOGIN_PATH, Some(&body)).await?;
		if response.is_ok() {
			info!(email, cookies = session.cookies().len(), "credential login succeeded");
			Ok(true)
		} else {
			warn!(
				email,
				status = response.status,
				body = %response.body.preview(500),
				"credential login failed"
			);
			Ok(false)
		}
	}

	/// Asks `provider` for credentials and tries them once.
	///
	/// Returns `None` when the user aborted or the exchange was rejected.
	pub async fn interactive_acquire(&self, session: &mut Session, provider: &mut dyn CredentialProvider) -> Result<Option<AuthMethod>> {
		let Some(credentials) = provider.choose().await? else {
			info!("authentication aborted by user");
			return Ok(None);
		};

		let accepted = match &credentials {
			Credentials::Token(token) => self.authenticate_with_token(session, token).await?,
			Credentials::Password { email, password } => self.authenticate_with_credentials(session, email, password).await?,
		};

		Ok(accepted.then_some(match credentials {
			Credentials::Token(_) => AuthMethod::Token,
			Credentials::Password { .. } => AuthMethod::Credentials,
		}))
	}

	/// Produces an authenticated session or fails with [`Error::Authentication`].
	///
	/// A pre-supplied `token` skips both the probe and the provider.
	pub async fn establish(&self, session: &mut Session, token: Option<&str>, provider: &mut dyn CredentialProvider) -> Result<AuthMethod> {
		if let Some(token) = token {
			return if self.authenticate_with_token(session, token).await? {
				Ok(AuthMethod::Token)
			} else {
				Err(Error::Authentication("the supplied API token was rejected".into()))
			};
		}

		if self.test_existing(session).await? {
			return Ok(AuthMethod::Existing);
		}

		self.interactive_acquire(session, provider)
			.await?
			.ok_or_else(|| Error::Authentication("no valid session was established".into()))
	}
}
