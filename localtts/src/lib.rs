//! Native on-device speech engine backed by eSpeak NG.
//!
//! Speaks through the `espeak-ng` executable (falling back to classic
//! `espeak`), which plays directly to the system audio device. One
//! utterance is in flight at a time; a new utterance or [`EspeakEngine`]
//! drop cancels the previous one by killing its process.

use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell, mpsc, oneshot};
use tracing::{debug, warn};

use aloud_speech::{Lang, NativeEngine, NativeEvent, SpeakOptions, SpeechError, VoiceInfo};

/// Candidate executables, probed in order.
const COMMANDS: &[&str] = &["espeak-ng", "espeak"];

/// eSpeak's default speaking rate in words per minute; option rates are
/// multipliers on top of it.
const BASE_WPM: f32 = 175.0;

/// Native engine speaking through the eSpeak executable.
pub struct EspeakEngine {
    command: OnceCell<Option<String>>,
    /// Cancellation slot for the in-flight utterance.
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self {
            command: OnceCell::new(),
            cancel: Mutex::new(None),
        }
    }

    /// Resolves the eSpeak executable, probing once per engine.
    async fn command(&self) -> Result<&str, SpeechError> {
        let resolved = self
            .command
            .get_or_init(|| async {
                for cmd in COMMANDS {
                    let probe = Command::new(cmd)
                        .arg("--version")
                        .stdout(Stdio::null())
                        .stderr(Stdio::null())
                        .status()
                        .await;
                    if probe.is_ok() {
                        debug!(command = cmd, "resolved espeak executable");
                        return Some((*cmd).to_string());
                    }
                }
                None
            })
            .await;
        resolved.as_deref().ok_or_else(|| {
            SpeechError::EngineNotAvailable("espeak-ng/espeak not found in PATH".into())
        })
    }

    /// Returns the eSpeak voice identifier for a playback language.
    pub fn voice_for(lang: Lang) -> &'static str {
        match lang {
            Lang::Zh => "zh",
            Lang::En => "en-us",
        }
    }

    fn build_args(opts: &SpeakOptions) -> Vec<String> {
        let wpm = (BASE_WPM * opts.rate).clamp(80.0, 450.0) as u32;
        let pitch = (50.0 * opts.pitch).clamp(0.0, 99.0) as u32;
        let amplitude = (100.0 * opts.volume).clamp(0.0, 200.0) as u32;
        vec![
            "-v".to_string(),
            Self::voice_for(opts.lang).to_string(),
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "--stdin".to_string(),
        ]
    }
}

#[async_trait]
impl NativeEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak"
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let command = self.command().await?;
        let output = Command::new(command)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Err(SpeechError::SynthesisFailed(format!(
                "{command} --voices exited with {}",
                output.status
            )));
        }
        Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn speak(
        &self,
        text: &str,
        opts: &SpeakOptions,
    ) -> Result<mpsc::Receiver<NativeEvent>, SpeechError> {
        // One utterance at a time.
        self.stop().await;

        let command = self.command().await?;
        let mut child = Command::new(command)
            .args(Self::build_args(opts))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            // Closing stdin tells espeak the utterance is complete.
            drop(stdin);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        *self.cancel.lock().await = Some(cancel_tx);

        let (tx, rx) = mpsc::channel::<NativeEvent>(8);
        tokio::spawn(async move {
            let _ = tx.send(NativeEvent::Started).await;
            let event = tokio::select! {
                status = child.wait() => match status {
                    Ok(s) if s.success() => NativeEvent::Ended,
                    // No exit code means the process was signalled — an
                    // external interruption, not an engine failure.
                    Ok(s) if s.code().is_none() => NativeEvent::Cancelled,
                    Ok(s) => NativeEvent::Error(format!("espeak exited with {s}")),
                    Err(e) => NativeEvent::Error(e.to_string()),
                },
                _ = cancel_rx => {
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "failed to kill espeak");
                    }
                    let _ = child.wait().await;
                    NativeEvent::Cancelled
                }
            };
            let _ = tx.send(event).await;
        });

        Ok(rx)
    }

    async fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().await.take() {
            let _ = cancel.send(());
        }
    }
}

/// Parses `espeak --voices` output.
///
/// Format: `Pty Language Age/Gender VoiceName File Other`, e.g.
/// ` 5  en-us          M  english-us           en/en-us`.
fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    let row = Regex::new(r"^\s*\d+\s+([\w-]+)\s+([MF-])\s+([\w#+-]+)").expect("static regex");
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let captures = row.captures(line)?;
            let lang = captures.get(1)?.as_str().to_string();
            let name = captures.get(3)?.as_str().to_string();
            Some(VoiceInfo {
                id: lang.clone(),
                lang,
                name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICE_LIST: &str = "\
Pty Language Age/Gender VoiceName          File          Other Languages
 5  af             M  afrikaans            other/af
 5  en-us          M  english-us           en/en-us      (en 3)
 5  zh             M  chinese-mandarin     zh
";

    #[test]
    fn test_parse_voice_list() {
        let voices = parse_voice_list(VOICE_LIST);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].lang, "en-us");
        assert_eq!(voices[1].name, "english-us");
        assert!(voices[1].matches_lang(Lang::En));
        assert!(voices[2].matches_lang(Lang::Zh));
        assert!(!voices[0].matches_lang(Lang::En));
    }

    #[test]
    fn test_parse_voice_list_skips_malformed_lines(){
        assert!(parse_voice_list("header only\n").is_empty());
        assert!(parse_voice_list("").is_empty());
    }

    #[test]
    fn test_build_args_mapping() {
        let mut opts = SpeakOptions::new(Lang::En);
        opts.rate = 2.0;
        opts.pitch = 0.5;
        opts.volume = 1.5;
        let args = EspeakEngine::build_args(&opts);
        assert_eq!(
            args,
            vec!["-v", "en-us", "-s", "350", "-p", "25", "-a", "150", "--stdin"]
        );
    }

    #[test]
    fn test_build_args_clamped() {
        let mut opts = SpeakOptions::new(Lang::Zh);
        opts.rate = 100.0;
        opts.pitch = 100.0;
        opts.volume = 100.0;
        let args = EspeakEngine::build_args(&opts);
        assert_eq!(
            args,
            vec!["-v", "zh", "-s", "450", "-p", "99", "-a", "200", "--stdin"]
        );
    }
}
