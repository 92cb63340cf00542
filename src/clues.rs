//! Clue assignment and bookkeeping
//!
//! This module hands out the per-operative clues that make the jammer a
//! cooperative puzzle: within one puzzle instance no two operatives ever
//! receive the same clue, so the squad is forced to pool what they know out
//! loud. Assignment is without replacement from a pool shuffled once at
//! creation, and it is committed: refetching after a dropped connection
//! returns the clue the operative already holds.

use std::collections::{HashMap, hash_map::Entry};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::roster::Id;

/// Errors that can occur during clue assignment
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every clue in the pool is already committed to some operative
    ///
    /// Instance creation rejects pools smaller than the squad, so this only
    /// fires when more operatives show up at runtime than the squad size the
    /// instance was created for.
    #[error("clue pool exhausted")]
    Exhausted,
}

/// Tracks which operative holds which clue for one puzzle instance
///
/// The pool is shuffled at construction; commitments then walk it front to
/// back, so uniqueness is structural rather than checked. The ledger lives
/// exactly as long as its puzzle instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClueLedger {
    /// The shuffled clue pool for this instance
    pool: Vec<String>,
    /// Committed assignments: operative -> index into `pool`
    assigned: HashMap<Id, usize>,
    /// Index of the first pool entry not yet committed
    next_unassigned: usize,
}

impl ClueLedger {
    /// Creates a ledger over the given pool, shuffling it in place
    pub fn new(mut pool: Vec<String>) -> Self {
        fastrand::shuffle(&mut pool);
        Self {
            pool,
            assigned: HashMap::new(),
            next_unassigned: 0,
        }
    }

    /// Returns the operative's clue, committing one on first call
    ///
    /// The first call for an operative selects the next uncommitted pool
    /// entry and remembers the choice; every later call returns the same
    /// clue. No side effects beyond the first-call commitment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if the operative holds no clue yet and
    /// the pool has none left to commit.
    pub fn assign(&mut self, member: Id) -> Result<&str, Error> {
        match self.assigned.entry(member) {
            Entry::Occupied(committed) => Ok(&self.pool[*committed.get()]),
            Entry::Vacant(slot) => {
                if self.next_unassigned >= self.pool.len() {
                    return Err(Error::Exhausted);
                }
                let index = self.next_unassigned;
                self.next_unassigned += 1;
                slot.insert(index);
                Ok(&self.pool[index])
            }
        }
    }

    /// Returns the clue already committed to an operative, if any
    ///
    /// Unlike [`ClueLedger::assign`] this never commits.
    pub fn committed(&self, member: Id) -> Option<&str> {
        self.assigned.get(&member).map(|i| self.pool[*i].as_str())
    }

    /// Returns how many clues remain uncommitted
    pub fn remaining(&self) -> usize {
        self.pool.len() - self.next_unassigned
    }
}
