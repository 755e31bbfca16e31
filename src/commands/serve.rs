//! The `run` command: load config and run the daemon.

use std::path::PathBuf;

use notifyd::config::Config;

use super::CommandResult;

pub async fn run(config_path: Option<PathBuf>, state_file: Option<PathBuf>) -> CommandResult {
    let config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::load_default()?,
    };
    notifyd::daemon::run(config, state_file).await
}
