//! Seam between the orchestrator and the audio playback host.
//!
//! The orchestrator only ever talks to [`AudioHost`]; the rodio-backed
//! [`PlayerHandle`] is the production implementation, and tests substitute
//! their own. Host creation goes through [`HostFactory`] so it can be
//! deferred until the first cloud utterance needs it.

use aloud_audio::{AudioError, HostRequest, PlayerEvent, PlayerHandle};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// The audio playback host as the orchestrator sees it.
#[async_trait]
pub trait AudioHost: Send + Sync {
    /// Plays a payload, implicitly stopping any current playback.
    async fn play(&self, req: HostRequest) -> Result<(), AudioError>;

    /// Stops the current playback, if any. Idempotent.
    async fn stop(&self);
}

/// Creates a playback host on first use. Terminal playback events must be
/// delivered on `events`.
#[async_trait]
pub trait HostFactory: Send + Sync {
    async fn create(
        &self,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Box<dyn AudioHost>, AudioError>;
}

#[async_trait]
impl AudioHost for PlayerHandle {
    async fn play(&self, req: HostRequest) -> Result<(), AudioError> {
        PlayerHandle::play(self, req).await
    }

    async fn stop(&self) {
        PlayerHandle::stop(self).await
    }
}

/// Spawns the real host thread with its rodio output stream.
pub struct RodioHostFactory;

#[async_trait]
impl HostFactory for RodioHostFactory {
    async fn create(
        &self,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Result<Box<dyn AudioHost>, AudioError> {
        let handle = PlayerHandle::spawn(events).await?;
        Ok(Box::new(handle))
    }
}
