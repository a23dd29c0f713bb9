//! `aloud config` - inspect and edit the configuration file.

use clap::{Args, Subcommand};

use aloud_geminispeech::voices;
use aloud_playback::{PlaybackMode, SettingsStore};
use aloud_speech::Lang;

use crate::Cli;
use super::settings_store;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the active configuration (API key redacted)
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// One of: mode, default-lang, speed, pitch, volume,
        /// cloud-enabled, api-key, zh-primary, zh-secondary,
        /// en-primary, en-secondary
        key: String,
        value: String,
    },
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let store = settings_store(cli)?;

        match &self.command {
            ConfigSubcommand::Path => {
                println!("{}", store.path().display());
            }
            ConfigSubcommand::Show => {
                let mut settings = store.load().await?;
                if !settings.cloud.api_key.is_empty() {
                    settings.cloud.api_key = "[REDACTED]".into();
                }
                print!("{}", serde_yaml_string(&settings)?);
            }
            ConfigSubcommand::Set { key, value } => {
                let mut settings = store.load().await?;
                apply(&mut settings, key, value)?;
                store.save(&settings)?;
                eprintln!("saved {}", store.path().display());
            }
        }
        Ok(())
    }
}

fn serde_yaml_string(settings: &aloud_playback::Settings) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(settings)?)
}

fn apply(settings: &mut aloud_playback::Settings, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "mode" => {
            settings.mode = match value {
                "auto" => PlaybackMode::Auto,
                "local" => PlaybackMode::Local,
                "cloud" => PlaybackMode::Cloud,
                _ => anyhow::bail!("mode must be auto, local, or cloud"),
            }
        }
        "default-lang" => {
            settings.default_lang = match value {
                "zh" => Lang::Zh,
                "en" => Lang::En,
                _ => anyhow::bail!("default-lang must be zh or en"),
            }
        }
        "speed" => settings.speed = parse_ratio(value, "speed")?,
        "pitch" => settings.pitch = parse_ratio(value, "pitch")?,
        "volume" => settings.volume = parse_ratio(value, "volume")?,
        "cloud-enabled" => {
            settings.cloud.enabled = value
                .parse()
                .map_err(|_| anyhow::anyhow!("cloud-enabled must be true or false"))?
        }
        "api-key" => settings.cloud.api_key = value.to_string(),
        "zh-primary" => settings.cloud.zh.primary = checked_voice(value)?,
        "zh-secondary" => settings.cloud.zh.secondary = checked_voice(value)?,
        "en-primary" => settings.cloud.en.primary = checked_voice(value)?,
        "en-secondary" => settings.cloud.en.secondary = checked_voice(value)?,
        _ => anyhow::bail!("unknown key {key:?}; see `aloud config set --help`"),
    }
    Ok(())
}

fn parse_ratio(value: &str, key: &str) -> anyhow::Result<f32> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("{key} must be a number"))?;
    anyhow::ensure!(parsed > 0.0, "{key} must be positive");
    Ok(parsed)
}

fn checked_voice(value: &str) -> anyhow::Result<String> {
    anyhow::ensure!(
        voices::is_prebuilt(value),
        "unknown voice {value:?}; run `aloud voices --cloud` for the list"
    );
    Ok(value.to_string())
}
