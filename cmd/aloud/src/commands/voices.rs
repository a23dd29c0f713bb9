//! `aloud voices` - list native and cloud voices.

use clap::Args;

use aloud_geminispeech::voices::PREBUILT;
use aloud_localtts::EspeakEngine;
use aloud_speech::NativeEngine;

use crate::Cli;

#[derive(Args)]
pub struct VoicesCommand {
    /// List cloud voices only
    #[arg(long)]
    pub cloud: bool,

    /// List native voices only
    #[arg(long)]
    pub native: bool,
}

impl VoicesCommand {
    pub async fn run(&self, _cli: &Cli) -> anyhow::Result<()> {
        let both = !self.cloud && !self.native;

        if both || self.native {
            println!("# native (eSpeak)");
            let engine = EspeakEngine::new();
            match engine.voices().await {
                Ok(voices) => {
                    for voice in voices {
                        println!("{:<12} {:<8} {}", voice.id, voice.lang, voice.name);
                    }
                }
                Err(e) => eprintln!("native voices unavailable: {e}"),
            }
        }

        if both || self.cloud {
            println!("# cloud (prebuilt)");
            for name in PREBUILT {
                println!("{name}");
            }
        }
        Ok(())
    }
}
