//! Tracing subscriber setup.
//!
//! Logs go to stdout, filtered by `RUST_LOG` (default `info`). When a log
//! file is configured, a plain-text copy is appended to it as well.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::{
    self,
    format::{DefaultFields, Format},
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Plain-text fmt layer appending to a log file.
pub type FileLayer<S> = fmt::Layer<S, DefaultFields, Format, Mutex<File>>;

/// Build the default filter, honoring `RUST_LOG` when set.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open `path` for appending (creating parent directories) and build a
/// non-ANSI layer writing to it.
pub fn file_layer<S>(path: &Path) -> anyhow::Result<FileLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
}

/// Install the global subscriber. Call once at startup.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file = match log_file {
        Some(path) => Some(file_layer(path)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .with(file)
        .try_init()?;

    if let Some(path) = log_file {
        tracing::info!("Logging to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_appends_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "earlier line\n").unwrap();

        let subscriber = tracing_subscriber::registry().with(file_layer(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(task_id = 3, "Created task");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier line\n"));
        assert!(contents.contains("Created task"));
        assert!(contents.contains("task_id=3"));
        assert!(!contents.contains('\u{1b}'));
    }

    #[test]
    fn file_layer_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("app.log");

        let _layer: FileLayer<tracing_subscriber::Registry> = file_layer(&path).unwrap();
        assert!(path.exists());
    }
}
