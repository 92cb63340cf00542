//! Session-wide client state
//!
//! The phase and current view of the local session, owned by the embedding
//! UI loop. Both the puzzle views and the navigation guard read it through
//! a reference; only the runtime mutates it, in response to server
//! broadcasts and local phase changes.

use serde::{Deserialize, Serialize};

use crate::stage::{Phase, Stage};

/// The operative's local session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    phase: Phase,
    view: Stage,
}

impl SessionContext {
    /// Creates a context resting in the lobby
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            view: Stage::Lobby,
        }
    }

    /// The coarse phase of the session
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The view the operative is currently on
    pub fn view(&self) -> Stage {
        self.view
    }

    /// Records a phase change
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Records a view change, typically after a squad-wide transition
    pub fn set_view(&mut self, view: Stage) {
        self.view = view;
    }
}

impl Default for SessionContext {
    /// Same as [`SessionContext::new`]
    fn default() -> Self {
        Self::new()
    }
}
