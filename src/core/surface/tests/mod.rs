
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::intent::IntentSnapshot;
use crate::core::surface::{SessionAttributes, SessionHandle};
use crate::interfaces::SurfacePlatform;

#[derive(Default)]
pub(crate) struct Calls {
    pub created: Vec<(SessionAttributes, IntentSnapshot, SessionHandle)>,
    pub updates: Vec<(SessionHandle, IntentSnapshot)>,
    pub ends: Vec<(SessionHandle, IntentSnapshot, Duration)>,
}

/// In-memory platform double recording every call the manager makes.
pub(crate) struct FakePlatform {
    enabled: bool,
    fail_creation: bool,
    fail_updates: bool,
    pub calls: StdMutex<Calls>,
    activation_tx: StdMutex<broadcast::Sender<String>>,
    external_tx: broadcast::Sender<SessionHandle>,
    session_token_tx: broadcast::Sender<String>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            enabled: true,
            fail_creation: false,
            fail_updates: false,
            calls: StdMutex::new(Calls::default()),
            activation_tx: StdMutex::new(broadcast::channel(16).0),
            external_tx: broadcast::channel(16).0,
            session_token_tx: broadcast::channel(16).0,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn failing_creation() -> Self {
        Self {
            fail_creation: true,
            ..Self::new()
        }
    }

    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::new()
        }
    }

    pub fn emit_activation_token(&self, token: &str) {
        let _ = self
            .activation_tx
            .lock()
            .unwrap()
            .send(token.to_string());
    }

    /// Close the current activation stream; observers are expected to
    /// re-subscribe and keep consuming from the replacement.
    pub fn restart_activation_stream(&self) {
        *self.activation_tx.lock().unwrap() = broadcast::channel(16).0;
    }

    pub fn emit_external_session(&self) -> SessionHandle {
        let handle = SessionHandle::new();
        let _ = self.external_tx.send(handle);
        handle
    }

    pub fn emit_session_token(&self, token: &str) {
        let _ = self.session_token_tx.send(token.to_string());
    }
}

#[async_trait]
impl SurfacePlatform for FakePlatform {
    fn surfaces_enabled(&self) -> bool {
        self.enabled
    }

    async fn request_session(
        &self,
        attributes: SessionAttributes,
        initial: IntentSnapshot,
    ) -> Result<SessionHandle> {
        if self.fail_creation {
            return Err(anyhow!("surface authorization denied"));
        }
        let handle = SessionHandle::new();
        self.calls
            .lock()
            .unwrap()
            .created
            .push((attributes, initial, handle));
        Ok(handle)
    }

    async fn update_session(
        &self,
        handle: &SessionHandle,
        snapshot: IntentSnapshot,
    ) -> Result<()> {
        self.calls.lock().unwrap().updates.push((*handle, snapshot));
        if self.fail_updates {
            return Err(anyhow!("transport failure"));
        }
        Ok(())
    }

    async fn end_session(
        &self,
        handle: &SessionHandle,
        final_snapshot: IntentSnapshot,
        linger: Duration,
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .ends
            .push((*handle, final_snapshot, linger));
        Ok(())
    }

    fn subscribe_activation_tokens(&self) -> broadcast::Receiver<String> {
        self.activation_tx.lock().unwrap().subscribe()
    }

    fn subscribe_external_sessions(&self) -> broadcast::Receiver<SessionHandle> {
        self.external_tx.subscribe()
    }

    fn subscribe_session_tokens(&self, _handle: &SessionHandle) -> broadcast::Receiver<String> {
        self.session_token_tx.subscribe()
    }
}

/// Poll until `predicate` holds; dispatches are fire-and-forget, so tests
/// wait instead of awaiting them directly.
pub(crate) async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
