//! The playback orchestrator.
//!
//! A single tokio task owns every piece of shared mutable state — the
//! status value, the owning surface, the pending cloud session — and
//! processes commands and engine events in arrival order. Long operations
//! (cloud synthesis, native utterances, host playback) run in spawned
//! tasks that report back over the internal event channel, carrying the
//! generation they were started under; the handler re-validates that
//! generation on every resumption so a late completion can never
//! resurrect a superseded session.

use std::sync::Arc;

use tokio::sync::{OnceCell, broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use aloud_audio::{HostRequest, PlayerEvent};
use aloud_speech::{
    AudioClip, CloudEngine, CloudError, Lang, NativeEngine, NativeEvent, SpeakOptions,
    detect_lang, redact_secret,
};

use crate::error::{PlaybackError, short_cloud_error};
use crate::host::{AudioHost, HostFactory, RodioHostFactory};
use crate::settings::{PlaybackMode, Settings, SettingsStore};
use crate::status::{PlaybackStatus, StatusPatch, StatusStore};
use crate::surface::{NoSelection, SelectionSource, SurfaceId, SurfaceNotice, SurfaceRegistry};

/// Selections shorter than this never form a request.
pub const MIN_SELECTION_CHARS: usize = 3;

const COMMAND_BUFFER: usize = 32;
const STATUS_BUFFER: usize = 16;

/// Which synthesis backend served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    Local,
    Cloud,
}

impl EngineChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineChoice::Local => "local",
            EngineChoice::Cloud => "cloud",
        }
    }
}

/// Successful reply to a play request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayReceipt {
    pub engine: EngineChoice,
    pub lang: Lang,
}

type PlayReply = oneshot::Sender<Result<PlayReceipt, PlaybackError>>;

enum Command {
    Play {
        text: String,
        origin: SurfaceId,
        reply: PlayReply,
    },
    PlaySelection {
        reply: PlayReply,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<PlaybackStatus>,
    },
    RegisterSurface {
        id: SurfaceId,
        reply: oneshot::Sender<mpsc::UnboundedReceiver<SurfaceNotice>>,
    },
}

/// Completions reported back by spawned work.
enum Event {
    Native {
        generation: u64,
        event: NativeEvent,
    },
    CloudFallback {
        generation: u64,
        voice: String,
    },
    CloudDone {
        generation: u64,
        outcome: Result<(String, AudioClip), CloudError>,
    },
    Host(PlayerEvent),
}

/// The surface currently driving playback, tagged with the request
/// generation it acquired ownership under.
struct Owner {
    surface: SurfaceId,
    generation: u64,
}

/// A cloud session awaiting its synthesis result.
struct PendingCloud {
    generation: u64,
    origin: SurfaceId,
    lang: Lang,
    rate: f32,
    volume: f32,
    api_key: String,
    reply: PlayReply,
}

/// Builder for the orchestrator task.
pub struct PlaybackBuilder {
    settings: Box<dyn SettingsStore>,
    native: Arc<dyn NativeEngine>,
    cloud: Arc<dyn CloudEngine>,
    selection: Arc<dyn SelectionSource>,
    host_factory: Box<dyn HostFactory>,
}

impl PlaybackBuilder {
    pub fn new(
        settings: Box<dyn SettingsStore>,
        native: Arc<dyn NativeEngine>,
        cloud: Arc<dyn CloudEngine>,
    ) -> Self {
        Self {
            settings,
            native,
            cloud,
            selection: Arc::new(NoSelection),
            host_factory: Box::new(RodioHostFactory),
        }
    }

    /// Sets the selection source consulted by `play_active_selection`.
    pub fn selection(mut self, selection: Arc<dyn SelectionSource>) -> Self {
        self.selection = selection;
        self
    }

    /// Replaces the audio host factory.
    pub fn host_factory(mut self, factory: Box<dyn HostFactory>) -> Self {
        self.host_factory = factory;
        self
    }

    /// Spawns the orchestrator and returns its handle.
    pub fn spawn(self) -> PlaybackHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = broadcast::channel(STATUS_BUFFER);

        let orchestrator = Orchestrator {
            settings: self.settings,
            native: self.native,
            cloud: self.cloud,
            selection: self.selection,
            host_factory: self.host_factory,
            host: OnceCell::new(),
            events_tx,
            status: StatusStore::new(),
            status_tx: status_tx.clone(),
            surfaces: SurfaceRegistry::new(),
            owner: None,
            generation: 0,
            host_generation: None,
            pending_cloud: None,
        };
        tokio::spawn(orchestrator.run(cmd_rx, events_rx));

        PlaybackHandle { cmd_tx, status_tx }
    }
}

/// Handle for talking to a running orchestrator.
#[derive(Clone)]
pub struct PlaybackHandle {
    cmd_tx: mpsc::Sender<Command>,
    status_tx: broadcast::Sender<PlaybackStatus>,
}

impl PlaybackHandle {
    /// Plays `text` on behalf of `origin`, taking ownership of playback.
    pub async fn play(
        &self,
        text: impl Into<String>,
        origin: SurfaceId,
    ) -> Result<PlayReceipt, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Play {
                text: text.into(),
                origin,
                reply,
            })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)?
    }

    /// Queries the active surface for its selection and plays it.
    pub async fn play_active_selection(&self) -> Result<PlayReceipt, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PlaySelection { reply })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)?
    }

    /// Stops all playback. Safe to call with nothing playing.
    pub async fn stop(&self) -> Result<(), PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Stop { reply })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)
    }

    /// Returns the current playback status.
    pub async fn status(&self) -> Result<PlaybackStatus, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Status { reply })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)
    }

    /// Registers a surface and returns its notice stream.
    pub async fn register_surface(
        &self,
        id: SurfaceId,
    ) -> Result<mpsc::UnboundedReceiver<SurfaceNotice>, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::RegisterSurface { id, reply })
            .await
            .map_err(|_| PlaybackError::Closed)?;
        rx.await.map_err(|_| PlaybackError::Closed)
    }

    /// Subscribes to status snapshots; one is published per transition.
    pub fn subscribe_status(&self) -> broadcast::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }
}

struct Orchestrator {
    settings: Box<dyn SettingsStore>,
    native: Arc<dyn NativeEngine>,
    cloud: Arc<dyn CloudEngine>,
    selection: Arc<dyn SelectionSource>,
    host_factory: Box<dyn HostFactory>,
    host: OnceCell<Box<dyn AudioHost>>,
    events_tx: mpsc::UnboundedSender<Event>,
    status: StatusStore,
    status_tx: broadcast::Sender<PlaybackStatus>,
    surfaces: SurfaceRegistry,
    owner: Option<Owner>,
    generation: u64,
    /// Generation whose audio the host is currently playing, if any.
    host_generation: Option<u64>,
    pending_cloud: Option<PendingCloud>,
}

impl Orchestrator {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut events_rx: mpsc::UnboundedReceiver<Event>,
    ) {
        debug!("playback orchestrator started");
        loop {
            tokio::select! {
                maybe = cmd_rx.recv() => match maybe {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(event) = events_rx.recv() => self.handle_event(event).await,
            }
        }
        debug!("playback orchestrator stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Play {
                text,
                origin,
                reply,
            } => self.handle_play(text, origin, reply).await,
            Command::PlaySelection { reply } => self.handle_play_selection(reply).await,
            Command::Stop { reply } => {
                self.handle_stop().await;
                let _ = reply.send(());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status.get());
            }
            Command::RegisterSurface { id, reply } => {
                let _ = reply.send(self.surfaces.register(id));
            }
        }
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Native { generation, event } => self.handle_native_event(generation, event),
            Event::CloudFallback { generation, voice } => {
                if self.is_current(generation) {
                    let label = self
                        .pending_cloud
                        .as_ref()
                        .map(|p| cloud_voice_label(p.lang, &voice));
                    if let Some(label) = label {
                        self.patch_status(StatusPatch::voice(label));
                    }
                }
            }
            Event::CloudDone {
                generation,
                outcome,
            } => self.handle_cloud_done(generation, outcome).await,
            Event::Host(event) => self.handle_host_event(event),
        }
    }

    /// True while `generation` is still the one driving playback.
    fn is_current(&self, generation: u64) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|o| o.generation == generation)
    }

    // ── play ───────────────────────────────────────────────────────

    async fn handle_play(&mut self, text: String, origin: SurfaceId, reply: PlayReply) {
        if text.trim().is_empty() {
            let _ = reply.send(Err(PlaybackError::EmptyText));
            return;
        }

        // Acquire ownership: evict the previous owner in this same turn.
        if let Some(previous) = self.owner.take() {
            if previous.surface != origin {
                debug!(from = %previous.surface, to = %origin, "transferring playback ownership");
                self.surfaces.notify(previous.surface, SurfaceNotice::Stopped);
            }
        }
        if let Some(stale) = self.pending_cloud.take() {
            let _ = stale.reply.send(Err(PlaybackError::Interrupted));
        }
        self.native.stop().await;
        if self.host_generation.take().is_some() {
            if let Some(host) = self.host.get() {
                host.stop().await;
            }
        }

        self.generation += 1;
        let generation = self.generation;
        self.owner = Some(Owner {
            surface: origin,
            generation,
        });

        // Fresh snapshot per request; edits apply from the next utterance.
        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "failed to load settings");
                self.fail_idle(origin, "Settings error");
                let _ = reply.send(Err(e));
                return;
            }
        };

        let lang = detect_lang(&text).unwrap_or(settings.default_lang);
        self.patch_status(StatusPatch::loading(lang));

        let use_cloud = match settings.mode {
            PlaybackMode::Cloud => true,
            PlaybackMode::Local => false,
            PlaybackMode::Auto => {
                let voices = self.native.voices().await.unwrap_or_default();
                // Voice enumeration suspends; re-validate before acting.
                if !self.is_current(generation) {
                    let _ = reply.send(Err(PlaybackError::Interrupted));
                    return;
                }
                let has_local_voice = voices.iter().any(|v| v.matches_lang(lang));
                !has_local_voice && settings.cloud.is_configured()
            }
        };

        let label = engine_label(settings.mode, use_cloud);
        self.patch_status(StatusPatch::engine(label));
        info!(engine = label, lang = %lang, chars = text.chars().count(), "starting playback");

        if use_cloud {
            if !settings.cloud.is_configured() {
                // Only reachable with explicit cloud mode: auto never
                // chooses an unconfigured cloud.
                let reason = if !settings.cloud.enabled {
                    "Cloud speech is disabled"
                } else {
                    "No API key configured"
                };
                self.fail_idle(origin, reason);
                let _ = reply.send(Err(PlaybackError::CloudNotConfigured(reason.to_string())));
                return;
            }
            self.start_cloud(generation, origin, text, lang, &settings, reply);
        } else {
            self.start_local(generation, origin, text, lang, &settings, reply)
                .await;
        }
    }

    async fn start_local(
        &mut self,
        generation: u64,
        origin: SurfaceId,
        text: String,
        lang: Lang,
        settings: &Settings,
        reply: PlayReply,
    ) {
        let opts = SpeakOptions {
            lang,
            rate: settings.speed,
            pitch: settings.pitch,
            volume: settings.volume,
        };
        self.patch_status(StatusPatch::voice(format!("{} (system)", lang.voice_prefix())));

        match self.native.speak(&text, &opts).await {
            Ok(mut rx) => {
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if events.send(Event::Native { generation, event }).is_err() {
                            break;
                        }
                    }
                });
                let _ = reply.send(Ok(PlayReceipt {
                    engine: EngineChoice::Local,
                    lang,
                }));
            }
            Err(e) => {
                warn!(error = %e, "native engine refused utterance");
                self.fail_idle(origin, "Local speech error");
                let _ = reply.send(Err(PlaybackError::Native(e.to_string())));
            }
        }
    }

    fn start_cloud(
        &mut self,
        generation: u64,
        origin: SurfaceId,
        text: String,
        lang: Lang,
        settings: &Settings,
        reply: PlayReply,
    ) {
        let pair = settings.cloud.voices_for(lang).clone();
        self.patch_status(StatusPatch::voice(cloud_voice_label(lang, &pair.primary)));
        self.surfaces.notify(origin, SurfaceNotice::Loading);
        self.pending_cloud = Some(PendingCloud {
            generation,
            origin,
            lang,
            rate: settings.speed,
            volume: settings.volume,
            api_key: settings.cloud.api_key.clone(),
            reply,
        });

        let cloud = self.cloud.clone();
        let events = self.events_tx.clone();
        let api_key = settings.cloud.api_key.clone();
        tokio::spawn(async move {
            let outcome = match cloud.synthesize(&text, &pair.primary, &api_key).await {
                Ok(clip) => Ok((pair.primary, clip)),
                Err(primary_err) if primary_err.is_voice_retryable() => {
                    warn!(voice = %pair.primary, error = %primary_err,
                        "primary voice failed, trying secondary");
                    let _ = events.send(Event::CloudFallback {
                        generation,
                        voice: pair.secondary.clone(),
                    });
                    cloud
                        .synthesize(&text, &pair.secondary, &api_key)
                        .await
                        .map(|clip| (pair.secondary, clip))
                }
                Err(fatal) => Err(fatal),
            };
            let _ = events.send(Event::CloudDone {
                generation,
                outcome,
            });
        });
    }

    async fn handle_cloud_done(
        &mut self,
        generation: u64,
        outcome: Result<(String, AudioClip), CloudError>,
    ) {
        let Some(pending) = self.pending_cloud.take_if(|p| p.generation == generation) else {
            // A completion for a session that no longer exists.
            return;
        };
        if !self.is_current(generation) {
            let _ = pending.reply.send(Err(PlaybackError::Interrupted));
            return;
        }

        match outcome {
            Err(err) => {
                warn!(error = %err, "cloud synthesis failed on both voices");
                self.owner = None;
                let short = short_cloud_error(&err, &pending.api_key);
                self.patch_status(StatusPatch::idle_with_error(short).clear_voice());
                self.surfaces.notify(pending.origin, SurfaceNotice::Error);
                let sanitized = redact_secret(&err.to_string(), &pending.api_key);
                let _ = pending.reply.send(Err(PlaybackError::Synthesis(sanitized)));
            }
            Ok((voice, clip)) => {
                debug!(voice = %voice, bytes = clip.data.len(), mime = %clip.mime_type,
                    "cloud synthesis complete");
                self.patch_status(StatusPatch::playing());

                if let Err(e) = self.ensure_host().await {
                    warn!(error = %e, "audio host creation failed");
                    self.fail_idle(pending.origin, "Audio host failed");
                    let _ = pending.reply.send(Err(PlaybackError::Host(e.to_string())));
                    return;
                }
                // Host creation suspends; re-validate before acting.
                if !self.is_current(generation) {
                    let _ = pending.reply.send(Err(PlaybackError::Interrupted));
                    return;
                }

                self.surfaces.notify(pending.origin, SurfaceNotice::Playing);
                let req = HostRequest {
                    data: clip.data,
                    mime_type: clip.mime_type,
                    rate: pending.rate,
                    volume: pending.volume,
                };
                let result = match self.host.get() {
                    Some(host) => host.play(req).await,
                    None => Err(aloud_audio::AudioError::HostDied),
                };
                match result {
                    Ok(()) => {
                        self.host_generation = Some(generation);
                        let _ = pending.reply.send(Ok(PlayReceipt {
                            engine: EngineChoice::Cloud,
                            lang: pending.lang,
                        }));
                    }
                    Err(e) => {
                        warn!(error = %e, "audio host rejected payload");
                        self.fail_idle(pending.origin, "Play failed");
                        let _ = pending.reply.send(Err(PlaybackError::Host(e.to_string())));
                    }
                }
            }
        }
    }

    // ── native + host events ───────────────────────────────────────

    fn handle_native_event(&mut self, generation: u64, event: NativeEvent) {
        if !self.is_current(generation) {
            return;
        }
        let Some(owner) = &self.owner else { return };
        let surface = owner.surface;
        match event {
            NativeEvent::Started => {
                self.patch_status(StatusPatch::playing());
                self.surfaces.notify(surface, SurfaceNotice::Playing);
            }
            NativeEvent::Ended | NativeEvent::Cancelled => {
                self.owner = None;
                self.reset_status();
                self.surfaces.notify(surface, SurfaceNotice::Stopped);
            }
            NativeEvent::Error(e) => {
                warn!(error = %e, "native engine error");
                self.fail_idle(surface, "Local speech error");
            }
        }
    }

    fn handle_host_event(&mut self, event: PlayerEvent) {
        let Some(generation) = self.host_generation.take() else {
            return;
        };
        if !self.is_current(generation) {
            return;
        }
        let Some(owner) = self.owner.take() else { return };
        let surface = owner.surface;
        match event {
            PlayerEvent::Ended => {
                self.reset_status();
                self.surfaces.notify(surface, SurfaceNotice::Stopped);
            }
            PlayerEvent::Error(e) => {
                warn!(error = %e, "audio host playback error");
                self.patch_status(StatusPatch::idle_with_error("Audio playback error").clear_voice());
                self.surfaces.notify(surface, SurfaceNotice::Error);
            }
        }
    }

    // ── stop + selection ───────────────────────────────────────────

    async fn handle_stop(&mut self) {
        debug!("stop requested");
        self.native.stop().await;
        if let Some(host) = self.host.get() {
            host.stop().await;
        }
        self.host_generation = None;
        self.generation += 1;
        if let Some(pending) = self.pending_cloud.take() {
            let _ = pending.reply.send(Err(PlaybackError::Interrupted));
        }
        self.reset_status();
        if let Some(owner) = self.owner.take() {
            self.surfaces.notify(owner.surface, SurfaceNotice::Stopped);
        }
    }

    async fn handle_play_selection(&mut self, reply: PlayReply) {
        match self.selection.active_selection().await {
            Some(selection) if selection.text.chars().count() >= MIN_SELECTION_CHARS => {
                self.handle_play(selection.text, selection.surface, reply)
                    .await;
            }
            _ => {
                let _ = reply.send(Err(PlaybackError::SelectionTooShort));
            }
        }
    }

    // ── shared plumbing ────────────────────────────────────────────

    /// Creates the audio host at most once; concurrent callers await the
    /// same in-flight creation.
    async fn ensure_host(&self) -> Result<(), aloud_audio::AudioError> {
        let events = self.events_tx.clone();
        let factory = &self.host_factory;
        self.host
            .get_or_try_init(|| async move {
                let (tx, mut rx) = mpsc::unbounded_channel();
                let host = factory.create(tx).await?;
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if events.send(Event::Host(event)).is_err() {
                            break;
                        }
                    }
                });
                Ok(host)
            })
            .await
            .map(|_| ())
    }

    /// Terminal failure: ownership released, status idle with the given
    /// error, origin notified.
    fn fail_idle(&mut self, origin: SurfaceId, error: &str) {
        self.owner = None;
        self.patch_status(StatusPatch::idle_with_error(error).clear_voice());
        self.surfaces.notify(origin, SurfaceNotice::Error);
    }

    fn patch_status(&mut self, patch: StatusPatch) {
        self.status.patch(patch);
        let _ = self.status_tx.send(self.status.get());
    }

    fn reset_status(&mut self) {
        self.status.reset();
        let _ = self.status_tx.send(self.status.get());
    }
}

fn engine_label(mode: PlaybackMode, use_cloud: bool) -> &'static str {
    match (mode, use_cloud) {
        (PlaybackMode::Auto, true) => "Auto→Cloud",
        (PlaybackMode::Auto, false) => "Auto→Local",
        (_, true) => "Cloud",
        (_, false) => "Local",
    }
}

fn cloud_voice_label(lang: Lang, voice: &str) -> String {
    format!("{} {}", lang.as_str().to_uppercase(), voice)
}
