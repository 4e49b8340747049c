use std::time::{Duration, Instant, SystemTime};

use uuid::Uuid;

pub type StepId = Uuid;

/// What a step represents. Affects presentation only, never behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Thinking,
    ToolCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    InProgress,
    Completed,
    Failed,
}

/// Terminal outcome applied by [`TaskActivity::finish_current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Failed,
}

impl StepOutcome {
    fn as_status(self) -> StepStatus {
        match self {
            StepOutcome::Completed => StepStatus::Completed,
            StepOutcome::Failed => StepStatus::Failed,
        }
    }
}

/// One unit of task progress: a burst of reasoning or a single tool call.
#[derive(Debug, Clone)]
pub struct ActivityStep {
    pub id: StepId,
    pub kind: StepKind,
    /// Short human label, e.g. "Searching flights".
    pub label: String,
    /// Long-form text: full reasoning or tool arguments. Grows over time.
    pub detail: String,
    pub status: StepStatus,
    /// Wall-clock creation time, for display. Never changes.
    pub started_at: SystemTime,
    /// Wall-clock completion time. Stamped exactly once.
    pub completed_at: Option<SystemTime>,
    // Monotonic pair backing `elapsed`, immune to wall-clock steps.
    started: Instant,
    finished: Option<Instant>,
}

impl ActivityStep {
    fn new(kind: StepKind, label: String, detail: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            label,
            detail,
            status: StepStatus::InProgress,
            started_at: SystemTime::now(),
            completed_at: None,
            started: Instant::now(),
            finished: None,
        }
    }

    /// Duration from start to completion, or to now while still in progress.
    /// Non-decreasing across reads; frozen once the step finishes.
    pub fn elapsed(&self) -> Duration {
        match self.finished {
            Some(end) => end.saturating_duration_since(self.started),
            None => self.started.elapsed(),
        }
    }

    /// Short elapsed form for inline rows: "2s", "1m 23s".
    pub fn formatted_elapsed(&self) -> String {
        let seconds = self.elapsed().as_secs();
        if seconds < 60 {
            return format!("{}s", seconds);
        }
        format!("{}m {}s", seconds / 60, seconds % 60)
    }

    /// Glyph name for inline rendering of this step.
    pub fn glyph(&self) -> &'static str {
        match self.kind {
            StepKind::Thinking => "brain",
            StepKind::ToolCall => match self.status {
                StepStatus::Completed => "check.circle",
                StepStatus::Failed => "x.circle",
                StepStatus::InProgress => "circle.dotted",
            },
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == StepStatus::InProgress
    }
}

/// Tracks all activity (reasoning + tool calls) for a single task run.
/// Append-only and chronological; ephemeral, never persisted across runs.
///
/// Callers keep at most one step in progress by calling `finish_current`
/// before `begin_step`.
#[derive(Debug, Default)]
pub struct TaskActivity {
    /// The label currently shown on the in-app shimmer line.
    pub current_label: String,
    /// Accumulated full reasoning text for the run.
    pub thinking_text: String,
    steps: Vec<ActivityStep>,
}

impl TaskActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new in-progress step and return its id.
    pub fn begin_step(
        &mut self,
        kind: StepKind,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> StepId {
        let label = label.into();
        self.current_label = label.clone();
        let step = ActivityStep::new(kind, label, detail.into());
        let id = step.id;
        self.steps.push(step);
        id
    }

    /// Accumulate detail text on an existing step. Unknown ids are ignored:
    /// detail can arrive late from a superseded run and must not crash.
    pub fn append_detail(&mut self, id: StepId, text: &str) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == id) {
            step.detail.push_str(text);
        }
    }

    /// Accumulate reasoning text for the run, mirrored onto the newest
    /// in-progress thinking step if there is one.
    pub fn append_thinking(&mut self, text: &str) {
        self.thinking_text.push_str(text);
        if let Some(step) = self
            .steps
            .iter_mut()
            .rev()
            .find(|s| s.kind == StepKind::Thinking && s.is_in_progress())
        {
            step.detail.push_str(text);
        }
    }

    /// Transition every in-progress step to the given outcome, stamping its
    /// completion time. Idempotent when nothing is in progress.
    pub fn finish_current(&mut self, outcome: StepOutcome) {
        let now = SystemTime::now();
        let instant = Instant::now();
        for step in self.steps.iter_mut().filter(|s| s.is_in_progress()) {
            step.status = outcome.as_status();
            step.completed_at = Some(now);
            step.finished = Some(instant);
        }
    }

    pub fn steps(&self) -> &[ActivityStep] {
        &self.steps
    }

    /// All finished steps, in chronological order. Used for inline rendering
    /// in the chat; entries are never removed.
    pub fn completed_steps(&self) -> impl Iterator<Item = &ActivityStep> {
        self.steps.iter().filter(|s| !s.is_in_progress())
    }

    pub fn in_progress(&self) -> Option<&ActivityStep> {
        self.steps.iter().find(|s| s.is_in_progress())
    }

    /// Clear the run for a new turn.
    pub fn reset(&mut self) {
        self.current_label.clear();
        self.thinking_text.clear();
        self.steps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_step_sets_current_label_and_appends() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::Thinking, "Thinking", "");
        activity.begin_step(StepKind::ToolCall, "Reading notes.md", "path: notes.md");

        assert_eq!(activity.current_label, "Reading notes.md");
        assert_eq!(activity.steps().len(), 2);
        assert_eq!(activity.steps()[0].label, "Thinking");
        assert_eq!(activity.steps()[1].label, "Reading notes.md");
    }

    #[test]
    fn append_detail_on_stale_id_is_a_noop() {
        let mut activity = TaskActivity::new();
        let id = activity.begin_step(StepKind::ToolCall, "Searching", "query: flights");
        activity.reset();

        // Detail from the superseded run arrives late.
        activity.append_detail(id, " LHR to JFK");
        assert!(activity.steps().is_empty());
    }

    #[test]
    fn append_detail_accumulates() {
        let mut activity = TaskActivity::new();
        let id = activity.begin_step(StepKind::ToolCall, "Searching", "query:");
        activity.append_detail(id, " flights");
        activity.append_detail(id, " to Lisbon");
        assert_eq!(activity.steps()[0].detail, "query: flights to Lisbon");
    }

    #[test]
    fn append_thinking_targets_newest_in_progress_thinking_step() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        activity.begin_step(StepKind::Thinking, "Thinking", "");
        activity.append_thinking("Comparing prices. ");
        activity.append_thinking("The 10:15 looks best.");

        assert_eq!(
            activity.thinking_text,
            "Comparing prices. The 10:15 looks best."
        );
        assert_eq!(
            activity.steps()[1].detail,
            "Comparing prices. The 10:15 looks best."
        );
        assert_eq!(activity.steps()[0].detail, "");
    }

    #[test]
    fn finish_current_stamps_all_in_progress_steps() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::Thinking, "Thinking", "");
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        activity.finish_current(StepOutcome::Completed);

        assert!(activity.in_progress().is_none());
        for step in activity.steps() {
            assert_eq!(step.status, StepStatus::Completed);
            assert!(step.completed_at.is_some());
        }
    }

    #[test]
    fn finish_current_is_idempotent() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        activity.finish_current(StepOutcome::Completed);
        let stamped = activity.steps()[0].completed_at;

        activity.finish_current(StepOutcome::Failed);
        assert_eq!(activity.steps()[0].status, StepStatus::Completed);
        assert_eq!(activity.steps()[0].completed_at, stamped);
    }

    #[test]
    fn failed_outcome_is_recorded() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Calling booking API", "");
        activity.finish_current(StepOutcome::Failed);
        assert_eq!(activity.steps()[0].status, StepStatus::Failed);
    }

    #[test]
    fn completed_steps_excludes_in_progress_and_keeps_order() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "first", "");
        activity.finish_current(StepOutcome::Completed);
        activity.begin_step(StepKind::ToolCall, "second", "");
        activity.finish_current(StepOutcome::Failed);
        activity.begin_step(StepKind::Thinking, "third", "");

        let labels: Vec<&str> = activity
            .completed_steps()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["first", "second"]);
    }

    #[test]
    fn elapsed_is_frozen_after_completion() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        std::thread::sleep(Duration::from_millis(10));
        activity.finish_current(StepOutcome::Completed);

        let first = activity.steps()[0].elapsed();
        std::thread::sleep(Duration::from_millis(10));
        let second = activity.steps()[0].elapsed();
        assert_eq!(first, second);
    }

    #[test]
    fn elapsed_is_non_decreasing_while_in_progress() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");

        let first = activity.steps()[0].elapsed();
        std::thread::sleep(Duration::from_millis(5));
        let second = activity.steps()[0].elapsed();
        assert!(second >= first);
    }

    #[test]
    fn formatted_elapsed_uses_short_forms() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        assert_eq!(activity.steps()[0].formatted_elapsed(), "0s");
    }

    #[test]
    fn tool_call_glyph_follows_status() {
        let mut activity = TaskActivity::new();
        activity.begin_step(StepKind::ToolCall, "Searching", "");
        assert_eq!(activity.steps()[0].glyph(), "circle.dotted");
        activity.finish_current(StepOutcome::Completed);
        assert_eq!(activity.steps()[0].glyph(), "check.circle");
    }
}
