//! Mission stages and the squad's shared stage pointer
//!
//! A heist session walks every squad through the same ordered sequence of
//! minigame views. The stage pointer is owned by the server and only ever
//! moves forward: once a squad is on a stage, no trigger may move it back,
//! and duplicate or reordered advancement triggers collapse into no-ops.

use serde::{Deserialize, Serialize};

/// The minigame view a squad can be on
///
/// Variant order is mission order; the derived `Ord` is what makes stage
/// advancement checks meaningful.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Stage {
    /// Waiting room before the mission starts
    Lobby,
    /// Mission briefing shown to the assembled squad
    Briefing,
    /// The signal jammer code-breaking puzzle
    SignalJammer,
    /// The lock tumbler puzzle that follows the jammer
    Tumbler,
    /// Final getaway view once every puzzle is cleared
    Extraction,
}

/// Coarse phase of the client session, used to arm the navigation guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No active mission; navigation is unrestricted
    Lobby,
    /// A mission is underway; progression is one-directional
    Mission,
    /// Mission over, results on screen
    Debrief,
}

/// The squad's shared stage pointer
///
/// Mutated exclusively through [`StageState::advance`], which enforces the
/// monotonicity invariant: the sequence of recorded stages is strictly
/// increasing for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageState {
    current: Stage,
}

impl StageState {
    /// Creates a stage pointer resting at the lobby
    pub fn new() -> Self {
        Self {
            current: Stage::Lobby,
        }
    }

    /// Returns the stage the squad is currently on
    ///
    /// This is the read surface the surrounding session layer uses to
    /// resynchronize operatives on reconnect.
    pub fn current(&self) -> Stage {
        self.current
    }

    /// Moves the pointer to `next` if that is strictly ahead of the
    /// current stage
    ///
    /// # Returns
    ///
    /// `true` if the pointer moved, `false` for a duplicate or backward
    /// target (the call is then a no-op).
    pub fn advance(&mut self, next: Stage) -> bool {
        if next > self.current {
            self.current = next;
            true
        } else {
            false
        }
    }
}

impl Default for StageState {
    /// Same as [`StageState::new`]
    fn default() -> Self {
        Self::new()
    }
}
