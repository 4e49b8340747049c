mod console;

pub use console::ConsoleSurface;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::intent::IntentSnapshot;
use crate::core::surface::{SessionAttributes, SessionHandle};

/// The asynchronous seam to the out-of-process status surface.
///
/// The surface cannot be repainted directly: every change goes through this
/// rate-limited channel as a complete snapshot, and the platform applies
/// whatever arrives last. Implementations must tolerate concurrent calls.
///
/// The three `subscribe_*` methods expose platform event streams as
/// broadcast receivers. A closed receiver is not an error; consumers
/// re-subscribe (the platform may recreate the stream at any time).
#[async_trait]
pub trait SurfacePlatform: Send + Sync {
    /// Whether the host environment currently allows status surfaces.
    fn surfaces_enabled(&self) -> bool;

    /// Create a new surface session showing the initial snapshot.
    async fn request_session(
        &self,
        attributes: SessionAttributes,
        initial: IntentSnapshot,
    ) -> Result<SessionHandle>;

    /// Replace the session's displayed state with a newer snapshot.
    async fn update_session(&self, handle: &SessionHandle, snapshot: IntentSnapshot)
    -> Result<()>;

    /// Show the final snapshot, keep the surface visible for `linger`, then
    /// let it disappear.
    async fn end_session(
        &self,
        handle: &SessionHandle,
        final_snapshot: IntentSnapshot,
        linger: Duration,
    ) -> Result<()>;

    /// Credentials that let an external trigger create sessions on our
    /// behalf while the app is not running.
    fn subscribe_activation_tokens(&self) -> broadcast::Receiver<String>;

    /// Sessions instantiated by the platform outside of `request_session`,
    /// e.g. triggered remotely by a push signal.
    fn subscribe_external_sessions(&self) -> broadcast::Receiver<SessionHandle>;

    /// Per-session push tokens identifying the routable endpoint for future
    /// remote updates to that session.
    fn subscribe_session_tokens(&self, handle: &SessionHandle) -> broadcast::Receiver<String>;
}
