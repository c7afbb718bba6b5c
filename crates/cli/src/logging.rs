use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// 0 = errors only; the staged log on stderr is the normal progress output
/// 1 (-v) = info for flowpush crates, warn for the HTTP stack
/// 2+ (-vv) = debug for everything
fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error",
		1 => "warn,flowpush=info,flowpush_cli=info",
		_ => "debug,hyper_util=info,rustls=info",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use std::io;
	use std::sync::{Arc, Mutex};

	use tempfile::TempDir;

	use super::*;

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn verbose_filter_shows_library_events_under_module_target() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("workflow.json");
		std::fs::write(&path, r#"{"name":"UGC","nodes":[{"type":"webhook"}]}"#).unwrap();

		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(default_filter(1)))
			.with_writer(move || writer.clone())
			.with_ansi(false)
			.with_target(true)
			.compact()
			.finish();

		tracing::subscriber::with_default(subscriber, || flowpush::definition::load(&path)).unwrap();

		let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
		assert!(output.contains("flowpush::definition"), "{output}");
		assert!(output.contains("workflow definition loaded"), "{output}");
		assert!(!output.contains("target="), "{output}");
	}

	#[test]
	fn quiet_filter_hides_library_info() {
		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(default_filter(0)))
			.with_writer(move || writer.clone())
			.with_ansi(false)
			.finish();

		let secrets = tracing::subscriber::with_default(subscriber, || flowpush::Secrets::from_lookup(["UNSET"], |_| None));

		assert_eq!(secrets.missing(), ["UNSET"]);
		assert!(captured.0.lock().unwrap().is_empty());
	}
}
