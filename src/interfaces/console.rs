use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use console::style;
use tokio::sync::broadcast;
use tracing::debug;

use crate::core::intent::IntentSnapshot;
use crate::core::surface::{SessionAttributes, SessionHandle};

use super::SurfacePlatform;

/// Renders surface sessions as styled cards on the terminal.
///
/// Stands in for the platform widget API in the demo binary: always
/// enabled, applies every snapshot immediately, and exposes manual
/// triggers for the token and session streams.
pub struct ConsoleSurface {
    activation_tx: broadcast::Sender<String>,
    external_tx: broadcast::Sender<SessionHandle>,
    session_token_tx: broadcast::Sender<String>,
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self {
            activation_tx: broadcast::channel(16).0,
            external_tx: broadcast::channel(16).0,
            session_token_tx: broadcast::channel(16).0,
        }
    }

    /// Demo trigger: pretend the platform rotated the push-to-start
    /// credential.
    pub fn emit_activation_token(&self, token: &str) {
        let _ = self.activation_tx.send(token.to_string());
    }

    /// Demo trigger: pretend a push signal created a session remotely.
    pub fn emit_external_session(&self) -> SessionHandle {
        let handle = SessionHandle::new();
        let _ = self.external_tx.send(handle);
        handle
    }

    pub fn emit_session_token(&self, token: &str) {
        let _ = self.session_token_tx.send(token.to_string());
    }

    fn render(&self, handle: &SessionHandle, snapshot: &IntentSnapshot) {
        let header = match (&snapshot.subject, &snapshot.cost_total) {
            (Some(subject), Some(cost)) => format!("{} · {}", subject, cost),
            (Some(subject), None) => subject.clone(),
            (None, Some(cost)) => cost.clone(),
            (None, None) => format!("session {}", handle),
        };
        println!(
            "  ┌─ {} {}",
            style(header).bold(),
            style(format!("(step {})", snapshot.step_number)).dim()
        );
        if let Some(label) = &snapshot.second_previous {
            println!("  │    {}", style(label).dim());
        }
        if let Some(label) = &snapshot.previous {
            println!("  │   {}", style(label).dim());
        }
        if let Some(label) = &snapshot.current {
            let marker = if snapshot.is_finished() { "✔" } else { "▸" };
            println!("  │ {} {}", marker, style(label).bold().cyan());
        }
        println!("  └─");
    }
}

#[async_trait]
impl SurfacePlatform for ConsoleSurface {
    fn surfaces_enabled(&self) -> bool {
        true
    }

    async fn request_session(
        &self,
        attributes: SessionAttributes,
        initial: IntentSnapshot,
    ) -> Result<SessionHandle> {
        let handle = SessionHandle::new();
        println!(
            "  {} {} — {}",
            style("surface up:").bold().green(),
            style(&attributes.context_name).bold(),
            attributes.task_summary
        );
        self.render(&handle, &initial);
        Ok(handle)
    }

    async fn update_session(
        &self,
        handle: &SessionHandle,
        snapshot: IntentSnapshot,
    ) -> Result<()> {
        if let Ok(wire) = serde_json::to_string(&snapshot) {
            debug!("Surface payload for {}: {}", handle, wire);
        }
        self.render(handle, &snapshot);
        Ok(())
    }

    async fn end_session(
        &self,
        handle: &SessionHandle,
        final_snapshot: IntentSnapshot,
        linger: Duration,
    ) -> Result<()> {
        self.render(handle, &final_snapshot);
        debug!(
            "Console surface {} lingers {}s before dismissal",
            handle,
            linger.as_secs()
        );
        Ok(())
    }

    fn subscribe_activation_tokens(&self) -> broadcast::Receiver<String> {
        self.activation_tx.subscribe()
    }

    fn subscribe_external_sessions(&self) -> broadcast::Receiver<SessionHandle> {
        self.external_tx.subscribe()
    }

    fn subscribe_session_tokens(&self, _handle: &SessionHandle) -> broadcast::Receiver<String> {
        self.session_token_tx.subscribe()
    }
}
