//! The audio playback host.
//!
//! Runs on a dedicated OS thread that owns the `rodio` output stream and
//! decodes byte payloads into playable audio. The thread is the isolated
//! execution context: callers hold a [`PlayerHandle`] and communicate over
//! channels only.
//!
//! Event contract: every `play` that returns `Ok` is followed by exactly
//! one terminal [`PlayerEvent`] — `Ended` on natural completion or `Error`
//! on a playback failure. A play superseded by another `play` or by `stop`
//! emits nothing; `stop` with nothing playing is a no-op.

use std::io::Cursor;
use std::thread;

use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::AudioError;

/// A one-shot playback request.
#[derive(Debug, Clone)]
pub struct HostRequest {
    /// Container bytes (WAV or any format the decoder understands).
    pub data: Vec<u8>,
    /// MIME type of `data`; informational, the decoder sniffs the bytes.
    pub mime_type: String,
    /// Playback rate multiplier.
    pub rate: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
}

/// Terminal lifecycle events, one per successfully started play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Playback finished naturally.
    Ended,
    /// Playback failed after it had started.
    Error(String),
}

enum PlayerCommand {
    Play {
        req: HostRequest,
        reply: oneshot::Sender<Result<(), AudioError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    /// Sent by a completion watcher when its sink drains.
    Drained {
        play_id: u64,
    },
    Shutdown,
}

/// `Send + Sync` handle to the playback host thread.
pub struct PlayerHandle {
    cmd_tx: mpsc::UnboundedSender<PlayerCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PlayerHandle {
    /// Spawns the host thread and opens the default audio output device.
    ///
    /// Terminal events for every subsequent play arrive on `events_tx`.
    pub async fn spawn(
        events_tx: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Self, AudioError> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<PlayerCommand>();
        let (init_tx, init_rx) = oneshot::channel::<Result<(), AudioError>>();

        let internal_tx = cmd_tx.clone();
        let thread = thread::Builder::new()
            .name("aloud-player".into())
            .spawn(move || run(cmd_rx, internal_tx, events_tx, init_tx))
            .map_err(|e| AudioError::Output(format!("failed to spawn host thread: {e}")))?;

        match init_rx.await {
            Ok(Ok(())) => Ok(Self {
                cmd_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::HostDied),
        }
    }

    /// Plays a payload, implicitly stopping any current playback first.
    pub async fn play(&self, req: HostRequest) -> Result<(), AudioError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(PlayerCommand::Play { req, reply })
            .map_err(|_| AudioError::HostDied)?;
        rx.await.map_err(|_| AudioError::HostDied)?
    }

    /// Stops the current playback, if any. Idempotent.
    pub async fn stop(&self) {
        let (reply, rx) = oneshot::channel();
        if self.cmd_tx.send(PlayerCommand::Stop { reply }).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Host thread body. Owns the output stream and the current sink; neither
/// crosses a thread boundary.
fn run(
    mut cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    internal_tx: mpsc::UnboundedSender<PlayerCommand>,
    events_tx: mpsc::UnboundedSender<PlayerEvent>,
    init_tx: oneshot::Sender<Result<(), AudioError>>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(AudioError::Output(e.to_string())));
            return;
        }
    };
    if init_tx.send(Ok(())).is_err() {
        return;
    }
    debug!("playback host started on default output device");

    // The id distinguishes the current play from watchers of superseded
    // ones; `Drained` with a stale id or an empty slot is ignored.
    let mut play_id: u64 = 0;
    let mut current: Option<std::sync::Arc<Sink>> = None;

    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            PlayerCommand::Play { req, reply } => {
                // Implicit stop of any in-progress playback.
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                play_id += 1;

                let result = start_play(&stream_handle, req, play_id, &internal_tx);
                match result {
                    Ok(sink) => {
                        current = Some(sink);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        warn!(error = %e, "playback failed to start");
                        let _ = reply.send(Err(e));
                    }
                }
            }

            PlayerCommand::Stop { reply } => {
                if let Some(sink) = current.take() {
                    sink.stop();
                    debug!("playback stopped");
                }
                let _ = reply.send(());
            }

            PlayerCommand::Drained { play_id: id } => {
                if id == play_id && current.is_some() {
                    current = None;
                    let _ = events_tx.send(PlayerEvent::Ended);
                }
            }

            PlayerCommand::Shutdown => break,
        }
    }

    if let Some(sink) = current.take() {
        sink.stop();
    }
    debug!("playback host shutting down");
}

/// Decodes and starts one payload, returning the live sink.
fn start_play(
    stream_handle: &rodio::OutputStreamHandle,
    req: HostRequest,
    play_id: u64,
    internal_tx: &mpsc::UnboundedSender<PlayerCommand>,
) -> Result<std::sync::Arc<Sink>, AudioError> {
    debug!(
        bytes = req.data.len(),
        mime = %req.mime_type,
        rate = req.rate,
        "decoding payload"
    );

    let decoder =
        Decoder::new(Cursor::new(req.data)).map_err(|e| AudioError::Decode(e.to_string()))?;

    let sink = Sink::try_new(stream_handle).map_err(|e| AudioError::Output(e.to_string()))?;
    sink.set_speed(req.rate);
    sink.set_volume(req.volume);
    sink.append(decoder);

    let sink = std::sync::Arc::new(sink);

    // Completion watcher: blocks until the sink drains (or is stopped) and
    // reports back; the command loop decides whether the drain was natural.
    let watcher_sink = sink.clone();
    let watcher_tx = internal_tx.clone();
    thread::Builder::new()
        .name("aloud-player-watch".into())
        .spawn(move || {
            watcher_sink.sleep_until_end();
            let _ = watcher_tx.send(PlayerCommand::Drained { play_id });
        })
        .map_err(|e| AudioError::Output(format!("failed to spawn watcher: {e}")))?;

    Ok(sink)
}
