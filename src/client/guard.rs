//! Navigation guard for active missions
//!
//! Mission progress is one-directional: there is deliberately no undo of a
//! stage transition, so the browser's back button must not be able to walk
//! an operative out of the mission or back through earlier puzzles. The
//! guard keeps a buffer frame on the navigation stack and answers every
//! backward signal by pushing a replacement frame for the current view:
//! the back action lands on an identical frame and nothing visibly changes.
//! Destructive exits (tab close, refresh) get a confirmation prompt
//! instead; an exit the operative explicitly confirms goes through.

use serde::Serialize;

use crate::stage::{Phase, Stage};

use super::context::SessionContext;

/// Warning shown when an operative tries to close or refresh mid-mission
pub const EXIT_WARNING: &str =
    "You have an active mission in progress. Are you sure you want to leave?";

/// A navigation-stack entry tagged with the view it represents
///
/// Pushed by the runtime into the browser history (or its platform
/// equivalent) whenever the guard says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationFrame {
    /// The view this frame pins the operative to
    pub view: Stage,
    /// Whether a session was active when the frame was pushed
    pub session_active: bool,
}

/// Side effects the embedding runtime must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEffect {
    /// Push this frame onto the navigation stack
    PushFrame(NavigationFrame),
    /// Ask the operative to confirm a destructive exit
    ///
    /// Confirmation must remain possible: the guard warns, it never
    /// blocks an exit the operative explicitly confirms.
    ConfirmExit {
        /// The warning text to display
        message: &'static str,
    },
}

/// Frame pushed while a session is active
fn active_frame(view: Stage) -> NavigationFrame {
    NavigationFrame {
        view,
        session_active: true,
    }
}

/// Whether the guard is armed, and for which view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    /// No active session; navigation is unrestricted
    Inert,
    /// Session active; backward motion is absorbed
    Guarded {
        /// The view the guard currently pins
        view: Stage,
    },
}

/// Absorbs backward navigation while a mission is active
///
/// Driven by the runtime: call [`NavigationGuard::observe`] whenever the
/// session context may have changed, and feed browser signals into
/// [`NavigationGuard::back_signal`] and [`NavigationGuard::exit_intent`].
#[derive(Debug)]
pub struct NavigationGuard {
    state: GuardState,
}

impl NavigationGuard {
    /// Creates a guard in the inert state
    pub fn new() -> Self {
        Self {
            state: GuardState::Inert,
        }
    }

    /// Whether the guard is currently armed
    pub fn is_guarded(&self) -> bool {
        matches!(self.state, GuardState::Guarded { .. })
    }

    /// Reconciles the guard with the session context
    ///
    /// Arms the guard when the phase leaves the lobby, pushing the buffer
    /// frame that keeps one back-action from exiting the application.
    /// While armed, a view change re-bases the back target onto the new
    /// view with a fresh frame. Disarms without effects when the phase
    /// returns to the lobby.
    pub fn observe(&mut self, ctx: &SessionContext) -> Vec<GuardEffect> {
        let active = ctx.phase() != Phase::Lobby;

        match (self.state, active) {
            (GuardState::Inert, true) => {
                self.state = GuardState::Guarded { view: ctx.view() };
                vec![GuardEffect::PushFrame(active_frame(ctx.view()))]
            }
            (GuardState::Guarded { view }, true) if view != ctx.view() => {
                self.state = GuardState::Guarded { view: ctx.view() };
                vec![GuardEffect::PushFrame(active_frame(ctx.view()))]
            }
            (GuardState::Guarded { .. }, false) => {
                self.state = GuardState::Inert;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Handles a backward-navigation signal (the popped history entry)
    ///
    /// While armed, the signal is absorbed: the runtime pushes a
    /// replacement frame for the current view and the operative sees no
    /// change, however many times they press back. While inert, backward
    /// navigation is none of the guard's business.
    pub fn back_signal(&self) -> Option<GuardEffect> {
        match self.state {
            GuardState::Guarded { view } => Some(GuardEffect::PushFrame(active_frame(view))),
            GuardState::Inert => None,
        }
    }

    /// Handles an exit-intent signal (tab close, refresh)
    pub fn exit_intent(&self) -> Option<GuardEffect> {
        match self.state {
            GuardState::Guarded { .. } => Some(GuardEffect::ConfirmExit {
                message: EXIT_WARNING,
            }),
            GuardState::Inert => None,
        }
    }
}

impl Default for NavigationGuard {
    /// Same as [`NavigationGuard::new`]
    fn default() -> Self {
        Self::new()
    }
}
