use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::core::activity::StepKind;

/// Sentinel shown while the first real step is still forming.
pub const STARTING_INTENT: &str = "Thinking...";
/// Terminal label stamped on the final snapshot of a run.
pub const TERMINAL_INTENT: &str = "Complete";

/// Glyph hint for the current intent, by step kind.
pub fn intent_glyph(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Thinking => "brain",
        StepKind::ToolCall => "wrench",
    }
}

fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// A complete, self-contained record of the intent window at one moment.
///
/// Snapshots replace, never patch, prior surface state: the remote side may
/// apply them late or out of order, and last-write-wins still converges.
/// Absent fields mean "no card", never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSnapshot {
    /// Latched task title, e.g. "Flight booking".
    pub subject: Option<String>,
    /// The latest intent, shown in the footer.
    pub current: Option<String>,
    /// Glyph name for the current intent's category.
    pub icon: Option<String>,
    /// The previous intent, shown as the top card.
    pub previous: Option<String>,
    /// The intent before that, shown as the card behind.
    pub second_previous: Option<String>,
    pub step_number: u32,
    /// When the current intent started, for the live timer. Epoch millis.
    pub intent_started_at_ms: u64,
    /// Recorded once the run ends; drives `is_finished`.
    pub intent_ended_at_ms: Option<u64>,
    /// Formatted running cost, e.g. "$0.49".
    pub cost_total: Option<String>,
}

impl IntentSnapshot {
    /// True once an end timestamp has been recorded: the surface should show
    /// its finished state and may dismiss after the linger period.
    pub fn is_finished(&self) -> bool {
        self.intent_ended_at_ms.is_some()
    }
}

/// Three-deep rolling window over the step labels of one task run, plus the
/// latched subject line and the running cost.
///
/// Labels older than the window fall off and are unrecoverable here; the
/// full history stays on the timeline.
#[derive(Debug)]
pub struct IntentStack {
    current: Option<String>,
    icon: Option<String>,
    previous: Option<String>,
    second_previous: Option<String>,
    step_number: u32,
    intent_started_at: SystemTime,
    ended_at: Option<SystemTime>,
    subject: Option<String>,
    cost_total: Option<String>,
}

impl Default for IntentStack {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentStack {
    pub fn new() -> Self {
        Self {
            current: None,
            icon: None,
            previous: None,
            second_previous: None,
            step_number: 0,
            intent_started_at: SystemTime::now(),
            ended_at: None,
            subject: None,
            cost_total: None,
        }
    }

    /// Clear the window, counters and latches for a new run (or after the
    /// final snapshot of a finished one).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The snapshot a brand-new session is created with: the starting
    /// sentinel displayed as step 1. Does not touch the window or the
    /// counter, so the first `shift` still sees an empty window.
    pub fn starting_snapshot(&self) -> IntentSnapshot {
        IntentSnapshot {
            subject: None,
            current: Some(STARTING_INTENT.to_string()),
            icon: Some(intent_glyph(StepKind::Thinking).to_string()),
            previous: None,
            second_previous: None,
            step_number: 1,
            intent_started_at_ms: epoch_ms(self.intent_started_at),
            intent_ended_at_ms: None,
            cost_total: None,
        }
    }

    /// Push a new label through the window: second_previous takes previous,
    /// previous takes current, current takes the new label. Increments the
    /// step counter, restarts the intent clock, latches the subject from the
    /// first non-empty hint, and overwrites the cost when a hint is present.
    pub fn shift(
        &mut self,
        label: &str,
        icon: Option<&str>,
        subject_hint: Option<&str>,
        cost_hint: Option<&str>,
    ) -> IntentSnapshot {
        self.second_previous = self.previous.take();
        self.previous = self.current.take();
        self.current = Some(label.to_string());
        self.icon = icon.map(str::to_string);
        self.step_number += 1;
        self.intent_started_at = SystemTime::now();

        if self.subject.is_none()
            && let Some(subject) = subject_hint
        {
            self.subject = Some(subject.to_string());
        }
        if let Some(cost) = cost_hint {
            self.cost_total = Some(cost.to_string());
        }

        self.snapshot()
    }

    /// Update the running cost without disturbing the window, the counter or
    /// the intent clock. Used for cost-only ticks between steps.
    pub fn overwrite_cost(&mut self, cost: &str) -> IntentSnapshot {
        self.cost_total = Some(cost.to_string());
        self.snapshot()
    }

    /// Record the end of the run: terminal label, frozen previous card,
    /// cleared second card, end timestamp set.
    pub fn final_snapshot(&mut self) -> IntentSnapshot {
        self.ended_at = Some(SystemTime::now());
        self.current = Some(TERMINAL_INTENT.to_string());
        self.icon = None;
        self.second_previous = None;
        self.snapshot()
    }

    pub fn step_number(&self) -> u32 {
        self.step_number
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn cost_total(&self) -> Option<&str> {
        self.cost_total.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    fn snapshot(&self) -> IntentSnapshot {
        IntentSnapshot {
            subject: self.subject.clone(),
            current: self.current.clone(),
            icon: self.icon.clone(),
            previous: self.previous.clone(),
            second_previous: self.second_previous.clone(),
            step_number: self.step_number,
            intent_started_at_ms: epoch_ms(self.intent_started_at),
            intent_ended_at_ms: self.ended_at.map(epoch_ms),
            cost_total: self.cost_total.clone(),
        }
    }
}
