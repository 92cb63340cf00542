//! Signal jammer puzzle implementation (server side)
//!
//! The signal jammer shows every operative the same grid of symbols but
//! gives each of them a different clue about which symbol kills the jammer.
//! This module owns the canonical answer: it validates the puzzle
//! configuration, commits clues through the [`crate::clues::ClueLedger`],
//! and evaluates guesses against the solution. The first correct guess wins
//! for the whole squad; everything after it is rejected as a no-op.
//!
//! Evaluation is serialized by ownership: every mutating method takes
//! `&mut self`, so whoever owns the instance (the squad's lock or actor)
//! defines the single authoritative evaluation order. The solved flag is
//! checked and set inside that exclusive region, which is what makes "at
//! most one success per instance" structural rather than best-effort.

use std::time::Duration;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    clues::ClueLedger,
    constants::jammer::{
        DEFAULT_FEEDBACK_DELAY_MS, MAX_CLUE_LENGTH, MAX_FEEDBACK_DELAY, MAX_POOL_SIZE,
        MAX_SYMBOL_COUNT, MIN_SYMBOL_COUNT,
    },
    roster::Id,
    stage::Stage,
};

type ValidationResult = garde::Result;

/// Validates the clue texts of a configured pool
///
/// Pool-level size bounds are handled by the `length` rule on the field;
/// this checks the individual entries and their pairwise distinctness, the
/// property the whole minigame rests on.
fn validate_clue_pool(pool: &[String]) -> ValidationResult {
    if pool.iter().any(|clue| clue.trim().is_empty()) {
        return Err(garde::Error::new("clue texts cannot be empty"));
    }
    if pool.iter().any(|clue| clue.len() > MAX_CLUE_LENGTH) {
        return Err(garde::Error::new(format!(
            "clue texts are limited to {MAX_CLUE_LENGTH} bytes"
        )));
    }
    if !pool.iter().all_unique() {
        return Err(garde::Error::new("clue pool entries must be distinct"));
    }
    Ok(())
}

/// Validates the success-feedback linger duration
fn validate_feedback_delay(val: &Duration) -> ValidationResult {
    if val.as_secs() <= MAX_FEEDBACK_DELAY {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "feedback_delay is outside of the bounds [0,{MAX_FEEDBACK_DELAY}]"
        )))
    }
}

/// Validates that the configured successor stage lies past the jammer
fn validate_advance_target(val: &Stage) -> ValidationResult {
    if *val > Stage::SignalJammer {
        Ok(())
    } else {
        Err(garde::Error::new(
            "advance_to must name a stage after the signal jammer",
        ))
    }
}

/// Default success-feedback linger
fn default_feedback_delay() -> Duration {
    Duration::from_millis(DEFAULT_FEEDBACK_DELAY_MS)
}

/// Configuration for one signal jammer puzzle
///
/// Field bounds are enforced with garde; the cross-field rules that need
/// runtime knowledge (solution within the grid, pool at least as large as
/// the squad) are enforced by [`JammerInstance::new`] so that a bad
/// configuration can never start serving clues.
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JammerConfig {
    /// Number of selectable symbols on the jammer grid
    #[garde(range(min = MIN_SYMBOL_COUNT, max = MAX_SYMBOL_COUNT))]
    pub symbol_count: usize,
    /// Index of the correct symbol within the grid
    #[garde(skip)]
    pub solution: usize,
    /// Candidate clues, one committed per operative without replacement
    #[garde(length(min = 1, max = MAX_POOL_SIZE), custom(|v, _| validate_clue_pool(v)))]
    pub clue_pool: Vec<String>,
    /// How long the solver's success feedback lingers before the squad
    /// advance is requested
    #[garde(custom(|v, _| validate_feedback_delay(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_feedback_delay")]
    pub feedback_delay: Duration,
    /// The stage the squad moves to once the jammer is down
    #[garde(custom(|v, _| validate_advance_target(v)))]
    pub advance_to: Stage,
}

/// Errors that prevent a puzzle instance from being created
///
/// All of these fire at instance creation. Operatives never see them; a
/// squad whose configuration is broken never enters the puzzle stage.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Field-level validation failed
    #[error(transparent)]
    Invalid(#[from] garde::Report),
    /// The configured solution does not point at a grid symbol
    #[error("solution index {solution} is outside the symbol grid of {symbols}")]
    SolutionOutOfRange {
        /// The configured solution index
        solution: usize,
        /// The configured grid size
        symbols: usize,
    },
    /// Fewer clues than operatives: uniqueness would be impossible
    #[error("clue pool holds {pool} clues but the squad has {squad} operatives")]
    PoolTooSmall {
        /// Number of clues in the configured pool
        pool: usize,
        /// Number of operatives in the squad
        squad: usize,
    },
}

/// Verdict of a single guess evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The guess named the solution; the instance is now solved
    Success,
    /// The guess named some other symbol; nothing changed
    Incorrect,
    /// The instance was already solved when the guess arrived
    ///
    /// Reported to the submitter as an ordinary failure, never as an error:
    /// under concurrent submissions exactly one operative observes
    /// [`GuessOutcome::Success`] and everyone later in the evaluation order
    /// lands here, including operatives who also picked the right symbol.
    AlreadySolved,
}

impl GuessOutcome {
    /// Whether this outcome is reported as `success: true` on the wire
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Update messages sent to individual operatives during the jammer
///
/// Both variants answer a specific operative's request; neither is ever
/// broadcast.
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// The operative's committed clue, or `null` if none could be committed
    ClueReveal {
        /// Clue text; `None` only when the pool ran out at runtime
        clue: Option<String>,
    },
    /// Verdict on the operative's guess
    GuessOutcome {
        /// `true` only for the single winning guess of the instance
        success: bool,
    },
}

/// Sync messages for operatives reconnecting during the jammer
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// Snapshot of the operative's view of the live instance
    Status {
        /// The operative's committed clue (committed now if need be)
        clue: Option<String>,
        /// Whether the instance is already solved
        solved: bool,
    },
}

/// One live occurrence of the jammer puzzle, scoped to a squad
///
/// Holds the canonical solution and the solved flag. Created when the squad
/// enters the jammer stage, dropped when the squad advances past it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JammerInstance {
    /// The validated configuration this instance was created from
    config: JammerConfig,
    /// Per-operative clue commitments
    clues: ClueLedger,
    /// Whether some operative already found the solution
    solved: bool,
}

impl JammerInstance {
    /// Creates an instance after validating the configuration against the
    /// squad
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Invalid`] - field-level bounds violated
    /// * [`ConfigError::SolutionOutOfRange`] - solution not on the grid
    /// * [`ConfigError::PoolTooSmall`] - fewer clues than operatives; a
    ///   fatal configuration fault caught here, never surfaced
    ///   per-operative at fetch time
    pub fn new(config: JammerConfig, squad_size: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.solution >= config.symbol_count {
            return Err(ConfigError::SolutionOutOfRange {
                solution: config.solution,
                symbols: config.symbol_count,
            });
        }
        if config.clue_pool.len() < squad_size {
            return Err(ConfigError::PoolTooSmall {
                pool: config.clue_pool.len(),
                squad: squad_size,
            });
        }

        log::info!(
            "jammer instance created: {} symbols, {} clues, squad of {squad_size}",
            config.symbol_count,
            config.clue_pool.len(),
        );

        Ok(Self {
            clues: ClueLedger::new(config.clue_pool.clone()),
            config,
            solved: false,
        })
    }

    /// Returns the operative's clue, committing one on first call
    ///
    /// Idempotent per operative; safe to call again after a reconnect.
    /// `None` only on runtime pool exhaustion, which is logged and
    /// surfaced to the operative as a null clue.
    pub fn clue_for(&mut self, member: Id) -> Option<&str> {
        match self.clues.assign(member) {
            Ok(clue) => Some(clue),
            Err(e) => {
                log::warn!("clue request from {member} denied: {e}");
                None
            }
        }
    }

    /// Evaluates one guess against the canonical solution
    ///
    /// The caller's exclusive ownership of `self` serializes concurrent
    /// submissions; within that order the first correct guess flips the
    /// solved flag and every later submission, correct or not, is a no-op
    /// [`GuessOutcome::AlreadySolved`]. Out-of-range indices evaluate as
    /// [`GuessOutcome::Incorrect`]. The server keeps no record of wrong
    /// guesses; that bookkeeping is advisory and client-local.
    pub fn submit_guess(&mut self, member: Id, symbol_index: usize) -> GuessOutcome {
        let received = SystemTime::now();

        if self.solved {
            log::debug!("guess {symbol_index} from {member} arrived after the solve");
            return GuessOutcome::AlreadySolved;
        }

        if symbol_index == self.config.solution {
            self.solved = true;
            log::info!("jammer solved by {member} with symbol {symbol_index}");
            GuessOutcome::Success
        } else {
            log::debug!("incorrect guess {symbol_index} from {member} at {received:?}");
            GuessOutcome::Incorrect
        }
    }

    /// Whether the instance has been solved
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// The stage the squad advances to when the jammer falls
    pub fn advance_to(&self) -> Stage {
        self.config.advance_to
    }

    /// The configured success-feedback linger
    pub fn feedback_delay(&self) -> Duration {
        self.config.feedback_delay
    }

    /// Number of symbols on the grid
    pub fn symbol_count(&self) -> usize {
        self.config.symbol_count
    }
}
