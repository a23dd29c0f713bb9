//! Requesting surfaces and their notifications.
//!
//! A surface is whatever UI asked for playback — the tab analog. Notices
//! are best-effort: a surface that went away simply stops receiving them.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// Opaque identifier of a requesting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Playback state notices pushed to the owning surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceNotice {
    Loading,
    Playing,
    Stopped,
    Error,
}

impl SurfaceNotice {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceNotice::Loading => "loading",
            SurfaceNotice::Playing => "playing",
            SurfaceNotice::Stopped => "stopped",
            SurfaceNotice::Error => "error",
        }
    }
}

/// Registered surfaces and their notice channels.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    senders: HashMap<SurfaceId, mpsc::UnboundedSender<SurfaceNotice>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id`, replacing any previous registration, and returns
    /// the receiving end of its notice channel.
    pub fn register(&mut self, id: SurfaceId) -> mpsc::UnboundedReceiver<SurfaceNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(id, tx);
        rx
    }

    /// Notify, ignoring absence of the recipient.
    pub fn notify(&mut self, id: SurfaceId, notice: SurfaceNotice) {
        trace!(%id, notice = notice.as_str(), "notifying surface");
        if let Some(tx) = self.senders.get(&id) {
            if tx.send(notice).is_err() {
                self.senders.remove(&id);
            }
        }
    }
}

/// The active surface's current text selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub surface: SurfaceId,
    pub text: String,
}

/// Queries the active surface for its selection; `None` when there is no
/// active surface or nothing is selected.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    async fn active_selection(&self) -> Option<Selection>;
}

/// A selection source for deployments without one.
pub struct NoSelection;

#[async_trait]
impl SelectionSource for NoSelection {
    async fn active_selection(&self) -> Option<Selection> {
        None
    }
}
