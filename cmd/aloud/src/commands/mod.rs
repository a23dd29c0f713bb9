//! CLI subcommands.

mod config;
mod speak;
mod voices;

pub use config::ConfigCommand;
pub use speak::SpeakCommand;
pub use voices::VoicesCommand;

use crate::Cli;
use aloud_playback::FileSettings;
use anyhow::Context;

/// Resolves the settings store from `--config` or the default location.
pub(crate) fn settings_store(cli: &Cli) -> anyhow::Result<FileSettings> {
    match &cli.config {
        Some(path) => Ok(FileSettings::new(path)),
        None => FileSettings::default_path()
            .map(FileSettings::new)
            .context("cannot determine home directory; pass --config"),
    }
}
