//! Orchestrator scenario tests with mock engines, stores, and hosts.

use super::*;
use aloud_audio::{AudioError, HostRequest, PlayerEvent};
use aloud_speech::{
    AudioClip, CloudEngine, CloudError, Lang, NativeEngine, NativeEvent, SpeakOptions,
    SpeechError, VoiceInfo,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

const KEY: &str = "AIzaSy-test-api-key";

// ============================================================================
// Mocks
// ============================================================================

struct MockSettings {
    settings: Mutex<Settings>,
}

impl MockSettings {
    fn new(settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            settings: Mutex::new(settings),
        })
    }

    fn set(&self, settings: Settings) {
        *self.settings.lock().unwrap() = settings;
    }
}

#[async_trait]
impl SettingsStore for Arc<MockSettings> {
    async fn load(&self) -> Result<Settings, PlaybackError> {
        Ok(self.settings.lock().unwrap().clone())
    }
}

struct MockNative {
    voices: Vec<VoiceInfo>,
    /// Events pushed into each utterance's stream right after `speak`.
    on_speak: Vec<NativeEvent>,
    speak_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    last_tx: Mutex<Option<mpsc::Sender<NativeEvent>>>,
}

impl Default for MockNative {
    fn default() -> Self {
        Self {
            voices: Vec::new(),
            on_speak: vec![NativeEvent::Started],
            speak_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            last_tx: Mutex::new(None),
        }
    }
}

impl MockNative {
    fn with_voices(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            ..Default::default()
        }
    }
}

#[async_trait]
impl NativeEngine for MockNative {
    fn name(&self) -> &str {
        "mock"
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        Ok(self.voices.clone())
    }

    async fn speak(
        &self,
        _text: &str,
        _opts: &SpeakOptions,
    ) -> Result<mpsc::Receiver<NativeEvent>, SpeechError> {
        self.speak_calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        for event in &self.on_speak {
            tx.send(event.clone()).await.ok();
        }
        *self.last_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.last_tx.lock().unwrap().take() {
            tx.try_send(NativeEvent::Cancelled).ok();
        }
    }
}

#[derive(Default)]
struct MockCloud {
    /// Voice names requested, in order.
    calls: Mutex<Vec<String>>,
    /// API key received on the last call.
    last_key: Mutex<Option<String>>,
    /// Per-voice forced failures; anything else succeeds.
    failures: HashMap<String, CloudError>,
    /// When set, synthesis blocks until the notify fires.
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl CloudEngine for MockCloud {
    async fn synthesize(
        &self,
        _text: &str,
        voice: &str,
        api_key: &str,
    ) -> Result<AudioClip, CloudError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.calls.lock().unwrap().push(voice.to_string());
        *self.last_key.lock().unwrap() = Some(api_key.to_string());
        match self.failures.get(voice) {
            Some(err) => Err(err.clone()),
            None => Ok(AudioClip::new(vec![1, 2, 3, 4], "audio/wav")),
        }
    }
}

#[derive(Clone, Default)]
struct MockHost {
    plays: Arc<Mutex<Vec<HostRequest>>>,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl AudioHost for MockHost {
    async fn play(&self, req: HostRequest) -> Result<(), AudioError> {
        self.plays.lock().unwrap().push(req);
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct MockHostFactory {
    host: MockHost,
    created: Arc<AtomicUsize>,
    fail: bool,
    /// Event sender handed over at creation, for tests to drive.
    events: Arc<Mutex<Option<mpsc::UnboundedSender<PlayerEvent>>>>,
}

#[async_trait]
impl HostFactory for MockHostFactory {
    async fn create(
        &self,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Box<dyn AudioHost>, AudioError> {
        if self.fail {
            return Err(AudioError::Output("no output device".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.events.lock().unwrap() = Some(events);
        Ok(Box::new(self.host.clone()))
    }
}

struct MockSelection {
    selection: Option<Selection>,
}

#[async_trait]
impl SelectionSource for MockSelection {
    async fn active_selection(&self) -> Option<Selection> {
        self.selection.clone()
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Rig {
    handle: PlaybackHandle,
    settings: Arc<MockSettings>,
    native: Arc<MockNative>,
    cloud: Arc<MockCloud>,
    factory: MockHostFactory,
}

fn rig_with(settings: Settings, native: MockNative, cloud: MockCloud) -> Rig {
    rig_full(settings, native, cloud, None)
}

fn rig_full(
    settings: Settings,
    native: MockNative,
    cloud: MockCloud,
    selection: Option<Selection>,
) -> Rig {
    let settings = MockSettings::new(settings);
    let native = Arc::new(native);
    let cloud = Arc::new(cloud);
    let factory = MockHostFactory::default();

    let handle = PlaybackBuilder::new(
        Box::new(settings.clone()),
        native.clone() as Arc<dyn NativeEngine>,
        cloud.clone() as Arc<dyn CloudEngine>,
    )
    .selection(Arc::new(MockSelection { selection }))
    .host_factory(Box::new(factory.clone()))
    .spawn();

    Rig {
        handle,
        settings,
        native,
        cloud,
        factory,
    }
}

fn cloud_settings(mode: PlaybackMode) -> Settings {
    let mut settings = Settings::default();
    settings.mode = mode;
    settings.cloud.enabled = true;
    settings.cloud.api_key = KEY.to_string();
    settings
}

fn en_voice() -> VoiceInfo {
    VoiceInfo::new("en-us", "en-US")
}

const EN_TEXT: &str = "The quick brown fox jumps over the lazy dog";

async fn wait_until(
    handle: &PlaybackHandle,
    pred: impl Fn(&PlaybackStatus) -> bool,
) -> PlaybackStatus {
    for _ in 0..200 {
        let status = handle.status().await.unwrap();
        if pred(&status) {
            return status;
        }
        tokio::task::yield_now().await;
    }
    panic!(
        "status condition not reached, last: {:?}",
        handle.status().await.unwrap()
    );
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SurfaceNotice>) -> Vec<SurfaceNotice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

// ============================================================================
// Engine selection
// ============================================================================

#[tokio::test]
async fn test_auto_without_local_voice_uses_cloud() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Auto),
        MockNative::with_voices(vec![VoiceInfo::new("af", "af")]),
        MockCloud::default(),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Cloud);
    assert_eq!(receipt.lang, Lang::En);

    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;
    assert_eq!(status.engine.as_deref(), Some("Auto→Cloud"));
    assert_eq!(status.voice.as_deref(), Some("EN Puck"));

    assert_eq!(*rig.cloud.calls.lock().unwrap(), vec!["Puck"]);
    assert_eq!(rig.cloud.last_key.lock().unwrap().as_deref(), Some(KEY));
    assert_eq!(rig.factory.host.plays.lock().unwrap().len(), 1);
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Loading, SurfaceNotice::Playing]
    );
}

#[tokio::test]
async fn test_auto_with_local_voice_prefers_local() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Auto),
        MockNative::with_voices(vec![en_voice()]),
        MockCloud::default(),
    );

    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Local);

    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;
    assert_eq!(status.engine.as_deref(), Some("Auto→Local"));
    assert_eq!(status.voice.as_deref(), Some("en (system)"));
    assert!(rig.cloud.calls.lock().unwrap().is_empty());
    assert_eq!(rig.native.speak_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_auto_with_unconfigured_cloud_falls_back_to_local() {
    let mut settings = Settings::default();
    settings.mode = PlaybackMode::Auto;
    // No voice matches and cloud is disabled: local regardless.
    let rig = rig_with(
        settings,
        MockNative::with_voices(vec![]),
        MockCloud::default(),
    );

    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Local);
    let status = rig.handle.status().await.unwrap();
    assert_eq!(status.engine.as_deref(), Some("Auto→Local"));
    assert_eq!(rig.native.speak_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_explicit_cloud_unconfigured_fails_outright() {
    let mut settings = Settings::default();
    settings.mode = PlaybackMode::Cloud;
    let rig = rig_with(settings, MockNative::default(), MockCloud::default());
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    match rig.handle.play(EN_TEXT, SurfaceId(1)).await {
        Err(PlaybackError::CloudNotConfigured(reason)) => {
            assert_eq!(reason, "Cloud speech is disabled")
        }
        other => panic!("expected CloudNotConfigured, got {other:?}"),
    }
    let status = rig.handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error.as_deref(), Some("Cloud speech is disabled"));
    assert_eq!(drain(&mut notices), vec![SurfaceNotice::Error]);
    assert_eq!(rig.native.speak_calls.load(Ordering::SeqCst), 0);

    // Enabled but keyless is the other guidance message.
    let mut settings = Settings::default();
    settings.mode = PlaybackMode::Cloud;
    settings.cloud.enabled = true;
    rig.settings.set(settings);
    match rig.handle.play(EN_TEXT, SurfaceId(1)).await {
        Err(PlaybackError::CloudNotConfigured(reason)) => {
            assert_eq!(reason, "No API key configured")
        }
        other => panic!("expected CloudNotConfigured, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_language_uses_configured_default() {
    let mut settings = Settings::default();
    settings.mode = PlaybackMode::Local;
    settings.default_lang = Lang::Zh;
    let rig = rig_with(settings, MockNative::default(), MockCloud::default());

    // Digits only: detection says unknown.
    let receipt = rig.handle.play("12345 67890 13579", SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.lang, Lang::Zh);
    assert_eq!(rig.handle.status().await.unwrap().lang, Some(Lang::Zh));
}

#[tokio::test]
async fn test_settings_loaded_fresh_per_request() {
    let mut settings = cloud_settings(PlaybackMode::Local);
    let rig = rig_with(
        settings.clone(),
        MockNative::default(),
        MockCloud::default(),
    );

    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Local);

    // Flip the stored mode; the very next request must see it.
    settings.mode = PlaybackMode::Cloud;
    rig.settings.set(settings);
    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Cloud);
    assert_eq!(*rig.cloud.calls.lock().unwrap(), vec!["Puck"]);
}

// ============================================================================
// Cloud fallback
// ============================================================================

#[tokio::test]
async fn test_primary_failure_retries_secondary_exactly_once() {
    let mut cloud = MockCloud::default();
    cloud.failures.insert(
        "Puck".into(),
        CloudError::Api {
            status: 500,
            body: "server error".into(),
        },
    );
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);

    let receipt = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Cloud);
    assert_eq!(*rig.cloud.calls.lock().unwrap(), vec!["Puck", "Charon"]);

    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;
    assert_eq!(status.voice.as_deref(), Some("EN Charon"));
}

#[tokio::test]
async fn test_both_voices_failing_surfaces_short_code() {
    let mut cloud = MockCloud::default();
    cloud.failures.insert(
        "Puck".into(),
        CloudError::Api {
            status: 500,
            body: String::new(),
        },
    );
    cloud.failures.insert(
        "Charon".into(),
        CloudError::Api {
            status: 429,
            body: "quota exhausted".into(),
        },
    );
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    match rig.handle.play(EN_TEXT, SurfaceId(1)).await {
        Err(PlaybackError::Synthesis(_)) => {}
        other => panic!("expected Synthesis error, got {other:?}"),
    }
    // Exactly two attempts, never a third.
    assert_eq!(*rig.cloud.calls.lock().unwrap(), vec!["Puck", "Charon"]);

    let status = rig.handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error.as_deref(), Some("429"));
    assert_eq!(status.voice, None);
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Loading, SurfaceNotice::Error]
    );
    assert!(rig.factory.host.plays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_timeout_maps_to_short_code() {
    let mut cloud = MockCloud::default();
    cloud
        .failures
        .insert("Puck".into(), CloudError::Timeout(30));
    cloud
        .failures
        .insert("Charon".into(), CloudError::Timeout(30));
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap_err();
    assert_eq!(
        rig.handle.status().await.unwrap().error.as_deref(),
        Some("Timeout")
    );
}

#[tokio::test]
async fn test_security_failure_is_not_retried() {
    let mut cloud = MockCloud::default();
    cloud.failures.insert(
        "Puck".into(),
        CloudError::Security("endpoint host mismatch".into()),
    );
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap_err();
    assert_eq!(*rig.cloud.calls.lock().unwrap(), vec!["Puck"]);
    assert_eq!(
        rig.handle.status().await.unwrap().state,
        PlaybackState::Idle
    );
}

#[tokio::test]
async fn test_api_key_never_reaches_a_surface() {
    let mut cloud = MockCloud::default();
    // An engine that leaks the key in both failures.
    cloud.failures.insert(
        "Puck".into(),
        CloudError::Protocol(format!("upstream said key={KEY} is odd")),
    );
    cloud.failures.insert(
        "Charon".into(),
        CloudError::Protocol(format!("again: {KEY}")),
    );
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);

    let err = rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap_err();
    assert!(!err.to_string().contains(KEY));

    let status = rig.handle.status().await.unwrap();
    assert!(!status.error.unwrap_or_default().contains(KEY));
}

// ============================================================================
// Ownership and stop
// ============================================================================

#[tokio::test]
async fn test_second_surface_evicts_first() {
    let rig = rig_with(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        MockNative::default(),
        MockCloud::default(),
    );
    let mut notices_a = rig.handle.register_surface(SurfaceId(1)).await.unwrap();
    let mut notices_b = rig.handle.register_surface(SurfaceId(2)).await.unwrap();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    rig.handle.play(EN_TEXT, SurfaceId(2)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    assert_eq!(
        drain(&mut notices_a),
        vec![SurfaceNotice::Playing, SurfaceNotice::Stopped]
    );
    assert_eq!(drain(&mut notices_b), vec![SurfaceNotice::Playing]);
    assert_eq!(rig.native.speak_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let rig = rig_with(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        MockNative::default(),
        MockCloud::default(),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    rig.handle.stop().await.unwrap();
    let status = rig.handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error, None);

    rig.handle.stop().await.unwrap();
    let status = rig.handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error, None);

    // One Stopped notice total — the second stop found no owner.
    // A short settle so any stray event would have landed.
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Playing, SurfaceNotice::Stopped]
    );
    assert!(rig.native.stop_calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_stop_with_nothing_playing_is_safe() {
    let rig = rig_with(Settings::default(), MockNative::default(), MockCloud::default());
    rig.handle.stop().await.unwrap();
    assert_eq!(
        rig.handle.status().await.unwrap(),
        PlaybackStatus::default()
    );
}

#[tokio::test]
async fn test_empty_text_is_a_no_op() {
    let rig = rig_with(Settings::default(), MockNative::default(), MockCloud::default());
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    match rig.handle.play("   \n", SurfaceId(1)).await {
        Err(PlaybackError::EmptyText) => {}
        other => panic!("expected EmptyText, got {other:?}"),
    }
    assert_eq!(
        rig.handle.status().await.unwrap(),
        PlaybackStatus::default()
    );
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_stop_during_cloud_synthesis_discards_late_result() {
    let gate = Arc::new(Notify::new());
    let mut cloud = MockCloud::default();
    cloud.gate = Some(gate.clone());
    let rig = rig_with(cloud_settings(PlaybackMode::Cloud), MockNative::default(), cloud);

    let handle = rig.handle.clone();
    let pending = tokio::spawn(async move { handle.play(EN_TEXT, SurfaceId(1)).await });
    wait_until(&rig.handle, |s| s.state == PlaybackState::Loading).await;

    rig.handle.stop().await.unwrap();
    assert_eq!(
        rig.handle.status().await.unwrap(),
        PlaybackStatus::default()
    );

    // Let the in-flight synthesis finish now; its result must be discarded.
    gate.notify_one();
    match pending.await.unwrap() {
        Err(PlaybackError::Interrupted) => {}
        other => panic!("expected Interrupted, got {other:?}"),
    }
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    let status = rig.handle.status().await.unwrap();
    assert_eq!(status, PlaybackStatus::default());
    assert!(rig.factory.host.plays.lock().unwrap().is_empty());
}

// ============================================================================
// Audio host
// ============================================================================

#[tokio::test]
async fn test_host_is_created_once_and_reused() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Cloud),
        MockNative::default(),
        MockCloud::default(),
    );

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    assert_eq!(rig.factory.created.load(Ordering::SeqCst), 1);
    assert_eq!(rig.factory.host.plays.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_host_creation_failure_surfaces_error() {
    let settings = MockSettings::new(cloud_settings(PlaybackMode::Cloud));
    let native = Arc::new(MockNative::default());
    let cloud = Arc::new(MockCloud::default());
    let mut factory = MockHostFactory::default();
    factory.fail = true;

    let handle = PlaybackBuilder::new(
        Box::new(settings),
        native as Arc<dyn NativeEngine>,
        cloud as Arc<dyn CloudEngine>,
    )
    .host_factory(Box::new(factory))
    .spawn();
    let mut notices = handle.register_surface(SurfaceId(1)).await.unwrap();

    match handle.play(EN_TEXT, SurfaceId(1)).await {
        Err(PlaybackError::Host(_)) => {}
        other => panic!("expected Host error, got {other:?}"),
    }
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error.as_deref(), Some("Audio host failed"));
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Loading, SurfaceNotice::Error]
    );
}

#[tokio::test]
async fn test_host_request_carries_rate_and_volume() {
    let mut settings = cloud_settings(PlaybackMode::Cloud);
    settings.speed = 1.5;
    settings.volume = 0.4;
    let rig = rig_with(settings, MockNative::default(), MockCloud::default());

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    let plays = rig.factory.host.plays.lock().unwrap();
    assert_eq!(plays.len(), 1);
    assert_eq!(plays[0].rate, 1.5);
    assert_eq!(plays[0].volume, 0.4);
    assert_eq!(plays[0].mime_type, "audio/wav");
}

#[tokio::test]
async fn test_host_ended_event_returns_to_idle() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Cloud),
        MockNative::default(),
        MockCloud::default(),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    let events = rig.factory.events.lock().unwrap().clone().unwrap();
    events.send(PlayerEvent::Ended).unwrap();

    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Idle).await;
    assert_eq!(status, PlaybackStatus::default());
    assert_eq!(
        drain(&mut notices),
        vec![
            SurfaceNotice::Loading,
            SurfaceNotice::Playing,
            SurfaceNotice::Stopped
        ]
    );
}

#[tokio::test]
async fn test_host_error_event_surfaces_playback_error() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Cloud),
        MockNative::default(),
        MockCloud::default(),
    );

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    let events = rig.factory.events.lock().unwrap().clone().unwrap();
    events.send(PlayerEvent::Error("decode failed".into())).unwrap();

    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Idle).await;
    assert_eq!(status.error.as_deref(), Some("Audio playback error"));
}

// ============================================================================
// Native engine events
// ============================================================================

#[tokio::test]
async fn test_native_end_releases_ownership() {
    let mut native = MockNative::default();
    native.on_speak = vec![NativeEvent::Started, NativeEvent::Ended];
    let rig = rig_with(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        native,
        MockCloud::default(),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    let status = wait_until(&rig.handle, |s| s.state == PlaybackState::Idle).await;
    assert_eq!(status, PlaybackStatus::default());
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Playing, SurfaceNotice::Stopped]
    );
}

#[tokio::test]
async fn test_native_error_surfaces_short_message() {
    let mut native = MockNative::default();
    native.on_speak = vec![NativeEvent::Started, NativeEvent::Error("boom".into())];
    let rig = rig_with(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        native,
        MockCloud::default(),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(1)).await.unwrap();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    let status = wait_until(&rig.handle, |s| s.error.is_some()).await;
    assert_eq!(status.state, PlaybackState::Idle);
    assert_eq!(status.error.as_deref(), Some("Local speech error"));
    assert_eq!(
        drain(&mut notices),
        vec![SurfaceNotice::Playing, SurfaceNotice::Error]
    );
}

// ============================================================================
// Selection playback
// ============================================================================

#[tokio::test]
async fn test_selection_below_minimum_is_rejected() {
    let rig = rig_full(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        MockNative::default(),
        MockCloud::default(),
        Some(Selection {
            surface: SurfaceId(9),
            text: "hi".into(),
        }),
    );
    match rig.handle.play_active_selection().await {
        Err(PlaybackError::SelectionTooShort) => {}
        other => panic!("expected SelectionTooShort, got {other:?}"),
    }
    assert_eq!(rig.native.speak_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_selection_plays_for_the_selecting_surface() {
    let rig = rig_full(
        Settings {
            mode: PlaybackMode::Local,
            ..Settings::default()
        },
        MockNative::default(),
        MockCloud::default(),
        Some(Selection {
            surface: SurfaceId(9),
            text: EN_TEXT.into(),
        }),
    );
    let mut notices = rig.handle.register_surface(SurfaceId(9)).await.unwrap();

    let receipt = rig.handle.play_active_selection().await.unwrap();
    assert_eq!(receipt.engine, EngineChoice::Local);
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;
    assert_eq!(drain(&mut notices), vec![SurfaceNotice::Playing]);
}

#[tokio::test]
async fn test_missing_selection_is_rejected() {
    let rig = rig_with(Settings::default(), MockNative::default(), MockCloud::default());
    assert!(matches!(
        rig.handle.play_active_selection().await,
        Err(PlaybackError::SelectionTooShort)
    ));
}

// ============================================================================
// Status broadcast
// ============================================================================

#[tokio::test]
async fn test_status_transitions_are_broadcast() {
    let rig = rig_with(
        cloud_settings(PlaybackMode::Cloud),
        MockNative::default(),
        MockCloud::default(),
    );
    let mut status_rx = rig.handle.subscribe_status();

    rig.handle.play(EN_TEXT, SurfaceId(1)).await.unwrap();
    wait_until(&rig.handle, |s| s.state == PlaybackState::Playing).await;

    let mut states = Vec::new();
    while let Ok(status) = status_rx.try_recv() {
        states.push(status.state);
    }
    assert!(states.contains(&PlaybackState::Loading));
    assert_eq!(states.last(), Some(&PlaybackState::Playing));
}
