mod config;
mod observers;
mod session;

pub use config::SurfaceConfig;
pub use observers::{SharedLedger, TokenLedger};
pub use session::{
    SessionAttributes, SessionHandle, SessionState, SurfaceSession, can_transition,
    truncate_summary,
};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::activity::StepKind;
use crate::core::intent::{IntentSnapshot, IntentStack, intent_glyph};
use crate::interfaces::SurfacePlatform;

/// Mirrors the intent window of the running task onto an out-of-process
/// status surface.
///
/// All local mutation happens synchronously on the calling context; only
/// the dispatch of a snapshot is spawned off. Snapshots are complete state
/// replacements, so a lost or reordered dispatch is superseded by the next
/// one and the surface converges under last-write-wins.
///
/// Constructed and owned by the task orchestrator; nothing here is global.
pub struct SurfaceManager {
    platform: Arc<dyn SurfacePlatform>,
    config: SurfaceConfig,
    intents: IntentStack,
    session: Option<SurfaceSession>,
    state: SessionState,
    /// True from `start` until `end`, even when no session could be created:
    /// local intent state keeps working headless, only dispatch is skipped.
    run_active: bool,
    /// Cancels the dismissal grace period of a pending end.
    linger_guard: Option<CancellationToken>,
    ledger: SharedLedger,
    observer_cancel: CancellationToken,
    observers: Vec<JoinHandle<()>>,
}

impl SurfaceManager {
    pub fn new(platform: Arc<dyn SurfacePlatform>, config: SurfaceConfig) -> Self {
        Self {
            platform,
            config,
            intents: IntentStack::new(),
            session: None,
            state: SessionState::Absent,
            run_active: false,
            linger_guard: None,
            ledger: SharedLedger::default(),
            observer_cancel: CancellationToken::new(),
            observers: Vec::new(),
        }
    }

    /// Spawn the long-lived activation-token observer. Tokens allow an
    /// external trigger to create sessions while the app is backgrounded;
    /// the manager only captures and exposes them via the ledger.
    pub fn observe_activation_tokens(&mut self) {
        let worker = observers::spawn_activation_token_observer(
            self.platform.clone(),
            self.ledger.clone(),
            self.observer_cancel.child_token(),
        );
        self.observers.push(worker);
    }

    /// Spawn the long-lived observer for sessions the platform instantiated
    /// outside of `start`. Adopted sessions are observed, never driven.
    pub fn observe_external_sessions(&mut self) {
        let worker = observers::spawn_external_session_observer(
            self.platform.clone(),
            self.ledger.clone(),
            self.observer_cancel.child_token(),
        );
        self.observers.push(worker);
    }

    /// Begin a new run and request a surface session showing the starting
    /// sentinel. An already-active session is ended implicitly with no
    /// grace period. When surfaces are unavailable the run still starts,
    /// headless: callers must not depend on a session existing.
    pub async fn start(&mut self, context_name: &str, task_summary: &str) {
        if self.run_active {
            self.finish_run(Duration::ZERO);
        }
        // A new run supersedes whatever grace period was still pending.
        if let Some(guard) = self.linger_guard.take() {
            guard.cancel();
        }

        self.intents.reset();
        self.run_active = true;

        if !self.config.enabled || !self.platform.surfaces_enabled() {
            info!("Status surfaces unavailable, continuing headless");
            return;
        }

        let attributes = SessionAttributes {
            context_name: context_name.to_string(),
            task_summary: truncate_summary(task_summary, self.config.summary_max_chars),
        };
        match self
            .platform
            .request_session(attributes, self.intents.starting_snapshot())
            .await
        {
            Ok(handle) => {
                debug_assert!(can_transition(self.state, SessionState::Active));
                info!("Surface session started: {}", handle);
                // The session's push token identifies the routable endpoint
                // for remote updates; capture it as it becomes available.
                observers::watch_session_tokens(
                    self.platform.clone(),
                    self.ledger.clone(),
                    handle,
                    self.observer_cancel.child_token(),
                );
                self.session = Some(SurfaceSession::new(handle));
                self.state = SessionState::Active;
            }
            Err(e) => {
                warn!("Failed to start surface session, continuing headless: {}", e);
            }
        }
    }

    /// Shift a new step label through the intent window and mirror the
    /// result. Outside a run this is a no-op; inside a headless run only
    /// the dispatch is skipped.
    pub fn report_step(
        &mut self,
        kind: StepKind,
        label: &str,
        subject_hint: Option<&str>,
        cost_hint: Option<&str>,
    ) {
        if !self.run_active {
            debug!("report_step outside a run, ignoring: {}", label);
            return;
        }
        let snapshot = self
            .intents
            .shift(label, Some(intent_glyph(kind)), subject_hint, cost_hint);
        self.dispatch(snapshot);
    }

    /// Update the running cost without disturbing the visible step stack.
    pub fn report_cost_only(&mut self, cost: &str) {
        if !self.run_active {
            debug!("report_cost_only outside a run, ignoring");
            return;
        }
        let snapshot = self.intents.overwrite_cost(cost);
        self.dispatch(snapshot);
    }

    /// End the run: dispatch the final snapshot, let the surface linger for
    /// the configured grace period, discard the session handle and reset the
    /// intent window. Idempotent once the run is over.
    pub fn end(&mut self) {
        self.finish_run(self.config.linger());
    }

    fn finish_run(&mut self, linger: Duration) {
        if !self.run_active {
            debug!("end outside a run, ignoring");
            return;
        }
        self.run_active = false;

        let final_snapshot = self.intents.final_snapshot();
        if let Some(session) = self.session.take() {
            debug_assert!(can_transition(self.state, SessionState::Ended));
            self.state = SessionState::Ended;

            let platform = self.platform.clone();
            let guard = CancellationToken::new();
            self.linger_guard = Some(guard.clone());
            tokio::spawn(async move {
                if let Err(e) = platform
                    .end_session(&session.handle, final_snapshot, linger)
                    .await
                {
                    warn!("Failed to deliver final surface snapshot: {}", e);
                }
                tokio::select! {
                    _ = guard.cancelled() => {
                        debug!("Grace period for surface session {} cut short", session.handle);
                    }
                    _ = tokio::time::sleep(linger) => {
                        debug!("Surface session {} dismissed", session.handle);
                    }
                }
            });

            // The handle is gone from our side; local cleanup is complete.
            debug_assert!(can_transition(self.state, SessionState::Absent));
            self.state = SessionState::Absent;
        }
        self.intents.reset();
    }

    /// Fire-and-forget delivery of one snapshot. Failures are logged and
    /// never retried: the next snapshot is a full replacement.
    fn dispatch(&self, snapshot: IntentSnapshot) {
        let Some(session) = &self.session else {
            return;
        };
        let platform = self.platform.clone();
        let handle = session.handle;
        tokio::spawn(async move {
            if let Err(e) = platform.update_session(&handle, snapshot).await {
                warn!("Surface update for {} failed, superseded by next: {}", handle, e);
            }
        });
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn intents(&self) -> &IntentStack {
        &self.intents
    }

    /// Credentials captured by the observers, shared with whatever component
    /// registers them with the push service.
    pub fn token_ledger(&self) -> SharedLedger {
        self.ledger.clone()
    }

    /// Stop the background observers. Called on process shutdown; sessions
    /// and pending lingers are left to the platform.
    pub async fn shutdown(&mut self) {
        self.observer_cancel.cancel();
        for worker in self.observers.drain(..) {
            if let Err(e) = worker.await {
                warn!("Surface observer ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests;
