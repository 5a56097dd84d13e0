//! File logging. The TUI owns the terminal, so records go to a log file in
//! the state directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Env, Target};

/// Environment variable holding the log filter, e.g. `COACH_LOG=debug`.
pub const LOG_ENV: &str = "COACH_LOG";

pub fn init(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("coach.log");
        init(&path).unwrap();
        log::info!("logger initialised");
        assert!(path.exists());

        // the global logger can only be installed once
        assert!(init(&dir.path().join("second.log")).is_err());
    }
}
