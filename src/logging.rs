//! Tracing setup.
//!
//! The terminal belongs to the game screen while it runs, so log output only
//! goes to a file when one is asked for. `WHACKAMOLE_LOG` (an `EnvFilter`
//! directive) takes precedence over the verbosity flag.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "WHACKAMOLE_LOG";

/// Maps a `-v` count to a tracing directive.
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber writing to `log_file`.
///
/// Without a file nothing is installed and events are dropped. Uses
/// `try_init`, so a second call is a no-op.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>) -> std::io::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(verbosity >= 2)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(3), "trace");
        assert_eq!(verbosity_to_directive(255), "trace");
    }

    #[test]
    fn no_file_installs_nothing() {
        assert!(init_logging(3, None).is_ok());
    }

    #[test]
    fn file_logging_creates_the_file_and_repeats_safely() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("game.log");
        init_logging(1, Some(&path)).unwrap();
        init_logging(2, Some(&path)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_path_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("game.log");
        assert!(init_logging(1, Some(&path)).is_err());
    }
}
