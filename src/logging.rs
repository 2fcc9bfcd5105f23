use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Builder, Env, Target};

use crate::app_dirs::AppDirs;

/// Environment variable holding the log filter, e.g. `WORDINVADER_LOG=debug`
pub const LOG_ENV: &str = "WORDINVADER_LOG";

/// Route `log` output to the state-dir log file; the terminal belongs to the TUI.
///
/// Logging stays off if the file cannot be opened.
pub fn init() {
    match AppDirs::log_path() {
        Some(path) => {
            if let Err(e) = init_to_file(&path) {
                eprintln!("logging disabled: {e}");
            }
        }
        None => eprintln!("logging disabled: no state directory"),
    }
}

pub fn init_to_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // a second init (e.g. from tests) is harmless
    let _ = Builder::from_env(Env::default().filter_or(LOG_ENV, "info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init();
    Ok(())
}
