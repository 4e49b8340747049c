use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::interfaces::SurfacePlatform;

use super::session::SessionHandle;

/// Delay before re-subscribing after a platform stream closes. Stream end is
/// never fatal; the platform may recreate the stream at any time.
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

/// Latest credentials captured from the platform token streams.
///
/// The engine never uses these itself; it records them so an external
/// trigger (push service, companion process) can address the surface.
#[derive(Debug, Default)]
pub struct TokenLedger {
    /// Credential allowing an external trigger to create sessions.
    pub activation_token: Option<String>,
    /// Per-session push tokens, including sessions we merely adopted.
    pub session_tokens: HashMap<SessionHandle, String>,
}

pub type SharedLedger = Arc<Mutex<TokenLedger>>;

/// Long-lived worker consuming the platform's activation-token stream for
/// the lifetime of the process.
pub(super) fn spawn_activation_token_observer(
    platform: Arc<dyn SurfacePlatform>,
    ledger: SharedLedger,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut rx = platform.subscribe_activation_tokens();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    received = rx.recv() => match received {
                        Ok(token) => {
                            info!("Surface activation token received: {}", token);
                            ledger.lock().await.activation_token = Some(token);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Only the latest credential matters.
                            warn!("Activation token stream lagged, skipped {}", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Activation token stream ended, re-subscribing");
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
            }
        }
    })
}

/// Long-lived worker watching for sessions the platform created outside of
/// `request_session`, e.g. triggered remotely by a push signal.
///
/// Adopted sessions keep their own state; we only observe their token
/// stream, never reset or drive their intent window.
pub(super) fn spawn_external_session_observer(
    platform: Arc<dyn SurfacePlatform>,
    ledger: SharedLedger,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let mut rx = platform.subscribe_external_sessions();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    received = rx.recv() => match received {
                        Ok(handle) => {
                            info!("Adopting externally created surface session {}", handle);
                            watch_session_tokens(
                                platform.clone(),
                                ledger.clone(),
                                handle,
                                cancel.child_token(),
                            );
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("External session stream lagged, skipped {}", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("External session stream ended, re-subscribing");
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
            }
        }
    })
}

/// Record push tokens for one session until its stream closes. A closed
/// per-session stream means the session is gone; no re-subscribe.
pub(super) fn watch_session_tokens(
    platform: Arc<dyn SurfacePlatform>,
    ledger: SharedLedger,
    handle: SessionHandle,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut rx = platform.subscribe_session_tokens(&handle);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                received = rx.recv() => match received {
                    Ok(token) => {
                        info!("Push token for surface session {}: {}", handle, token);
                        ledger.lock().await.session_tokens.insert(handle, token);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session token stream for {} lagged, skipped {}", handle, skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("Session token stream for {} ended", handle);
                        return;
                    }
                },
            }
        }
    });
}
