//! `aloud speak` - run the playback orchestrator for one utterance.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::io::AsyncReadExt;

use aloud_geminispeech::Client;
use aloud_localtts::EspeakEngine;
use aloud_playback::{PlaybackBuilder, SurfaceId, SurfaceNotice};

use crate::Cli;
use super::settings_store;

/// This process acts as the single requesting surface.
const CLI_SURFACE: SurfaceId = SurfaceId(1);

#[derive(Args)]
pub struct SpeakCommand {
    /// Text to speak; read from standard input when omitted
    pub text: Option<String>,
}

impl SpeakCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let text = match &self.text {
            Some(text) => text.clone(),
            None => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("reading text from stdin")?;
                buf
            }
        };

        let settings = settings_store(cli)?;
        let playback = PlaybackBuilder::new(
            Box::new(settings),
            Arc::new(EspeakEngine::new()),
            Arc::new(Client::builder().build()),
        )
        .spawn();

        let mut notices = playback.register_surface(CLI_SURFACE).await?;
        let receipt = playback.play(text, CLI_SURFACE).await?;
        eprintln!(
            "speaking [{} engine, {}]",
            receipt.engine.as_str(),
            receipt.lang
        );

        // Wait for the utterance to finish; Ctrl-C stops it cleanly.
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    playback.stop().await?;
                    eprintln!("stopped");
                    break;
                }
                notice = notices.recv() => match notice {
                    Some(SurfaceNotice::Stopped) => break,
                    Some(SurfaceNotice::Error) => {
                        let status = playback.status().await?;
                        anyhow::bail!(
                            "playback failed: {}",
                            status.error.unwrap_or_else(|| "unknown error".into())
                        );
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        Ok(())
    }
}
