use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of the remote mirror session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Active,
    Ended,
}

pub fn can_transition(from: SessionState, to: SessionState) -> bool {
    if from == to {
        return true;
    }
    match from {
        SessionState::Absent => matches!(to, SessionState::Active),
        SessionState::Active => matches!(to, SessionState::Ended),
        SessionState::Ended => matches!(to, SessionState::Absent),
    }
}

/// Opaque identifier for one surface session, minted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Static context a session is created with. Does not change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    pub context_name: String,
    pub task_summary: String,
}

/// The one live remote-mirror session, exclusively owned by the manager.
///
/// The session's push token arrives asynchronously on its token stream and
/// is recorded in the token ledger under this handle.
#[derive(Debug)]
pub struct SurfaceSession {
    pub handle: SessionHandle,
    pub started_at: SystemTime,
}

impl SurfaceSession {
    pub fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            started_at: SystemTime::now(),
        }
    }
}

/// Trim a task summary to the surface's display budget, ellipsized on a
/// character boundary.
pub fn truncate_summary(task: &str, max_chars: usize) -> String {
    if task.chars().count() <= max_chars {
        return task.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = task.chars().take(keep).collect();
    out.push_str("...");
    out
}
