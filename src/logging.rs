// Tracing setup for the duel runner
// Logs go to stderr, or with --debug to a truncated file that can be tailed

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_PATH: &str = "/tmp/bankshot-debug.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Info and above on stderr
    Stderr,
    /// Debug and above into a file
    File(PathBuf),
}

impl LogTarget {
    pub fn debug_file() -> Self {
        LogTarget::File(PathBuf::from(DEBUG_LOG_PATH))
    }

    fn default_level(&self) -> Level {
        match self {
            LogTarget::Stderr => Level::INFO,
            LogTarget::File(_) => Level::DEBUG,
        }
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise the target's default level
fn env_filter(target: &LogTarget) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(target.default_level().into())
        .from_env_lossy()
}

fn open_log_file(path: &Path) -> io::Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

/// Install the global subscriber.
///
/// # Arguments
/// * `target` - Where events are written
///
/// # Behavior
/// - File targets are created or truncated first; failure to open is returned
/// - A second call is a no-op (the first subscriber stays installed)
pub fn init(target: LogTarget) -> io::Result<()> {
    let filter = env_filter(&target);

    let result = match &target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    if result.is_ok() {
        if let LogTarget::File(path) = &target {
            tracing::info!("debug log started, to monitor: tail -f {}", path.display());
        }
    }
    Ok(())
}
