//! Secret placeholder substitution.
//!
//! Definitions reference secrets symbolically, e.g. `{{ $env.GEMINI_API_KEY }}`.
//! Before deployment the definition is serialized, every `{{ ... }}` token
//! mentioning a known name is replaced by the secret value, and the text is
//! parsed back. Names without a value are left exactly as written.

use std::collections::BTreeMap;

use flowpush_protocol::WorkflowDefinition;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::Result;

/// Secret values keyed by symbolic name.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
	values: BTreeMap<String, String>,
	missing: Vec<String>,
}

impl Secrets {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads each name from the process environment once.
	///
	/// Unset or empty variables are recorded as missing rather than failing.
	pub fn from_env<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::from_lookup(names, |name| std::env::var(name).ok())
	}

	/// Resolves each name through `lookup`.
	pub fn from_lookup<I, S, F>(names: I, lookup: F) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
		F: Fn(&str) -> Option<String>,
	{
		let mut secrets = Self::new();
		for name in names {
			let name = name.as_ref();
			match lookup(name).filter(|v| !v.is_empty()) {
				Some(value) => secrets.insert(name, value),
				None => {
					debug!(name, "secret not set");
					secrets.missing.push(name.to_string());
				}
			}
		}
		secrets
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		self.missing.retain(|m| *m != name);
		self.values.insert(name, value.into());
	}

	pub fn get(&self, name: &str) -> Option<&str> {
		self.values.get(name).map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Names that were requested but had no value.
	pub fn missing(&self) -> &[String] {
		&self.missing
	}
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Secrets {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		let mut secrets = Self::new();
		for (name, value) in iter {
			secrets.insert(name, value);
		}
		secrets
	}
}

/// Outcome of [`substitute`].
#[derive(Debug, Clone)]
pub struct Substitution {
	pub definition: WorkflowDefinition,
	/// Names that had a value and occurred at least once.
	pub applied: Vec<String>,
	/// Requested names without a value whose placeholders remain in the definition.
	pub unresolved: Vec<String>,
}

/// Replaces every placeholder for a known secret in one pass over the serialized definition.
pub fn substitute(definition: &WorkflowDefinition, secrets: &Secrets) -> Result<Substitution> {
	let text = serde_json::to_string(definition)?;

	let mut applied = Vec::new();
	let text = if secrets.is_empty() {
		text
	} else {
		let pattern = placeholder_pattern(secrets.values.keys())?;
		let replaced = pattern.replace_all(&text, |caps: &Captures<'_>| {
			let name = &caps[1];
			if !applied.iter().any(|a: &String| a == name) {
				applied.push(name.to_string());
			}
			secrets.get(name).map(json_fragment).unwrap_or_else(|| caps[0].to_string())
		});
		replaced.into_owned()
	};
	applied.sort();

	let unresolved = if secrets.missing.is_empty() {
		Vec::new()
	} else {
		let pattern = placeholder_pattern(&secrets.missing)?;
		let mut found: Vec<String> = pattern.captures_iter(&text).map(|caps| caps[1].to_string()).collect();
		found.sort();
		found.dedup();
		found
	};
	for name in &unresolved {
		warn!(name, "placeholder left unresolved");
	}

	Ok(Substitution {
		definition: serde_json::from_str(&text)?,
		applied,
		unresolved,
	})
}

/// Matches the shortest `{{ ... }}` token containing one of `names` as a whole word.
///
/// Runs over serialized JSON, so a token never spans an unescaped quote: it
/// stays inside a single string literal.
fn placeholder_pattern<I, S>(names: I) -> Result<Regex>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let alternatives: Vec<String> = names.into_iter().map(|n| regex::escape(n.as_ref())).collect();
	let body = r#"(?:[^{}"\\]|\\.)*?"#;
	let pattern = format!(r"\{{\{{{body}\b({})\b{body}\}}\}}", alternatives.join("|"));
	Ok(Regex::new(&pattern)?)
}

/// Escapes `value` for insertion inside a JSON string literal.
fn json_fragment(value: &str) -> String {
	let quoted = serde_json::Value::String(value.to_string()).to_string();
	quoted[1..quoted.len() - 1].to_string()
}
