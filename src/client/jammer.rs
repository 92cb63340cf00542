//! Signal jammer puzzle view (client side)
//!
//! The per-operative state machine behind the jammer screen. It requests
//! the operative's clue on start, dispatches at most one guess at a time,
//! remembers which symbols this operative already burned, and hands the
//! squad-wide transition through as the only thing that ever moves the
//! operative off the view; the solver's own success only triggers feedback
//! and a deferred advance request, never a local view switch.
//!
//! The wrong-guess set is a UI-affordance cache: it only grows, it is never
//! sent to the server, and every operative eliminates symbols
//! independently.

use std::{collections::HashSet, time::Duration};

use itertools::Itertools;

use crate::{
    constants::jammer::{DEFAULT_FEEDBACK_DELAY_MS, DEFAULT_SYMBOL_COUNT, MAX_DISPLAY_TRIES},
    stage::Stage,
};

/// Where the view is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewPhase {
    /// Clue requested, nothing usable on screen yet
    AwaitingClue,
    /// Clue on screen, grid unlocked
    Active,
    /// One guess in flight; the grid is locked until the verdict lands
    Submitting {
        /// The symbol index the in-flight guess names
        symbol_index: usize,
    },
    /// This instance is done for this operative; only the squad-wide
    /// transition leads out
    Solved,
}

/// Side effects the embedding runtime must carry out
///
/// Returned by every event method; the machine itself never touches the
/// transport or the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the clue request for this operative
    RequestClue,
    /// Send a guess naming the given symbol
    SubmitGuess {
        /// Index of the guessed symbol
        symbol_index: usize,
    },
    /// Fire the success feedback signal (overlay, haptics)
    SignalSuccess,
    /// Fire the error feedback signal (shake, haptics)
    SignalError,
    /// After `delay`, ask the server to advance the squad to `to`
    ///
    /// The request, not the authority: the view still waits for the
    /// broadcast before anything moves.
    RequestSquadAdvance {
        /// The successor stage to request
        to: Stage,
        /// How long the success feedback lingers first
        delay: Duration,
    },
    /// Switch the local view to `view`; emitted only for a received
    /// squad-wide transition
    ApplyView {
        /// The stage the squad is now on
        view: Stage,
    },
}

/// The jammer puzzle screen of a single operative
#[derive(Debug)]
pub struct JammerView {
    /// Number of symbols on the grid
    symbol_count: usize,
    /// The stage this puzzle advances into
    advance_to: Stage,
    /// How long the success feedback lingers before the advance request
    feedback_delay: Duration,
    /// Lifecycle position
    phase: ViewPhase,
    /// The clue this operative holds, once received
    clue: Option<String>,
    /// Symbol indices this operative already tried and got wrong
    wrong_guesses: HashSet<usize>,
    /// Whether `start` already ran
    started: bool,
}

impl JammerView {
    /// Creates a view for a grid of `symbol_count` symbols that advances
    /// into `advance_to`
    pub fn new(symbol_count: usize, advance_to: Stage, feedback_delay: Duration) -> Self {
        Self {
            symbol_count,
            advance_to,
            feedback_delay,
            phase: ViewPhase::AwaitingClue,
            clue: None,
            wrong_guesses: HashSet::new(),
            started: false,
        }
    }

    /// The standard 3x3 rune grid advancing into the tumbler
    pub fn standard() -> Self {
        Self::new(
            DEFAULT_SYMBOL_COUNT,
            Stage::Tumbler,
            Duration::from_millis(DEFAULT_FEEDBACK_DELAY_MS),
        )
    }

    /// Kicks the view off by requesting this operative's clue
    ///
    /// Idempotent: only the first call dispatches the request. There is no
    /// automatic retry; if the response never comes the view stays in its
    /// waiting state, a liveness debt owed by the transport.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        vec![Effect::RequestClue]
    }

    /// Feeds in the clue response
    ///
    /// A null clue (pool exhausted server-side) leaves the view waiting
    /// indefinitely; this is a configuration fault surfaced as a persistent
    /// "receiving transmission" indication, not something to retry. A
    /// second response after the clue landed is ignored; refetches are
    /// idempotent server-side, so the text could not differ anyway.
    pub fn clue_received(&mut self, clue: Option<String>) -> Vec<Effect> {
        if self.phase != ViewPhase::AwaitingClue {
            return Vec::new();
        }
        if let Some(text) = clue {
            self.clue = Some(text);
            self.phase = ViewPhase::Active;
        }
        Vec::new()
    }

    /// Handles the operative tapping a symbol
    ///
    /// Dispatches a guess only from the unlocked grid, for an index that is
    /// on the grid and not already known wrong. Everything else (a burned
    /// symbol, an in-flight guess, a solved instance, a missing clue) is
    /// silently suppressed with no request sent.
    pub fn pick_symbol(&mut self, symbol_index: usize) -> Vec<Effect> {
        if self.phase != ViewPhase::Active {
            return Vec::new();
        }
        if symbol_index >= self.symbol_count || self.wrong_guesses.contains(&symbol_index) {
            return Vec::new();
        }

        self.phase = ViewPhase::Submitting { symbol_index };
        vec![Effect::SubmitGuess { symbol_index }]
    }

    /// Feeds in the server's verdict on the in-flight guess
    ///
    /// On failure the guessed symbol joins the wrong-guess set and the grid
    /// unlocks. On success the view turns solved, fires the success
    /// feedback, and schedules the squad-advance request after the
    /// feedback delay. A verdict with no guess in flight (a stale callback
    /// after the view moved on) is dropped.
    pub fn guess_resolved(&mut self, success: bool) -> Vec<Effect> {
        let ViewPhase::Submitting { symbol_index } = self.phase else {
            return Vec::new();
        };

        if success {
            self.phase = ViewPhase::Solved;
            vec![
                Effect::SignalSuccess,
                Effect::RequestSquadAdvance {
                    to: self.advance_to,
                    delay: self.feedback_delay,
                },
            ]
        } else {
            self.wrong_guesses.insert(symbol_index);
            self.phase = ViewPhase::Active;
            vec![Effect::SignalError]
        }
    }

    /// Feeds in a squad-wide stage transition broadcast
    ///
    /// Handled identically whether this operative was the solver or not:
    /// the broadcast is what actually moves the view. An operative who
    /// never solved locally is still carried forward, and sees the success
    /// feedback, since the squad cracked the puzzle.
    pub fn view_changed(&mut self, view: Stage) -> Vec<Effect> {
        if view == self.advance_to && self.phase != ViewPhase::Solved {
            self.phase = ViewPhase::Solved;
            return vec![Effect::SignalSuccess, Effect::ApplyView { view }];
        }
        vec![Effect::ApplyView { view }]
    }

    /// The clue this operative holds, once received
    pub fn clue(&self) -> Option<&str> {
        self.clue.as_deref()
    }

    /// Whether the view is still waiting for its clue
    pub fn awaiting_clue(&self) -> bool {
        self.phase == ViewPhase::AwaitingClue
    }

    /// Whether a guess is currently in flight
    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, ViewPhase::Submitting { .. })
    }

    /// Whether the instance is solved from this operative's point of view
    pub fn is_solved(&self) -> bool {
        self.phase == ViewPhase::Solved
    }

    /// Whether a symbol was already tried and found wrong
    pub fn is_eliminated(&self, symbol_index: usize) -> bool {
        self.wrong_guesses.contains(&symbol_index)
    }

    /// Eliminated symbol indices in display order
    pub fn eliminated(&self) -> Vec<usize> {
        self.wrong_guesses.iter().copied().sorted().collect_vec()
    }

    /// The "tries remaining" readout
    ///
    /// Purely informational: the counter can reach zero and guessing keeps
    /// working, because the server never enforces a cap. Keeping the limit
    /// soft is a deliberate choice, not an oversight.
    pub fn tries_remaining(&self) -> usize {
        MAX_DISPLAY_TRIES.saturating_sub(self.wrong_guesses.len())
    }
}
