//! Squad membership and broadcast management
//!
//! This module tracks which operatives belong to a squad and provides the
//! messaging helpers the squad authority uses to reach them. Connections
//! themselves live outside the engine: every helper takes a tunnel-finder
//! closure that resolves an operative ID to their live tunnel, if any.
//! Removing a member deregisters them: a removed operative receives no
//! further broadcasts even if their tunnel is still resolvable, which is the
//! teardown obligation that keeps stale listeners from acting on events
//! meant for a later phase.

use std::{collections::HashSet, fmt::Display, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;

use super::{SyncMessage, UpdateMessage, session::Tunnel};

/// A unique identifier for an operative
///
/// Each operative gets a unique ID that persists throughout their
/// participation in the squad's session, across reconnects.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random operative ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random operative ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Errors that can occur when managing squad membership
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The squad has reached the maximum number of operatives
    #[error("maximum squad size reached")]
    SquadFull,
}

/// The set of operatives belonging to one squad
///
/// All members are peers: there is no host role, and any member's actions
/// can affect the whole squad. The roster is the single place that decides
/// who a broadcast reaches.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Roster {
    /// Operatives currently registered to the squad
    members: HashSet<Id>,
}

impl Roster {
    /// Creates an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operative with the squad
    ///
    /// # Errors
    ///
    /// Returns [`Error::SquadFull`] if the squad already holds
    /// [`crate::constants::squad::MAX_SIZE`] operatives. Re-adding an
    /// existing member is a no-op.
    pub fn add_member(&mut self, member: Id) -> Result<(), Error> {
        if !self.members.contains(&member)
            && self.members.len() >= crate::constants::squad::MAX_SIZE
        {
            return Err(Error::SquadFull);
        }

        self.members.insert(member);
        Ok(())
    }

    /// Deregisters an operative from the squad
    ///
    /// # Returns
    ///
    /// `true` if the operative was a member.
    pub fn remove_member(&mut self, member: Id) -> bool {
        self.members.remove(&member)
    }

    /// Checks whether an operative belongs to the squad
    pub fn contains(&self, member: Id) -> bool {
        self.members.contains(&member)
    }

    /// Returns the number of registered operatives
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterates over all registered operative IDs
    pub fn members(&self) -> impl Iterator<Item = Id> + '_ {
        self.members.iter().copied()
    }

    /// Gets a vector of all members with live tunnels
    ///
    /// # Arguments
    ///
    /// * `tunnel_finder` - Function to retrieve the tunnel for a given ID
    ///
    /// # Returns
    ///
    /// Vector of `(Id, Tunnel)` pairs for members with active connections
    pub fn vec<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) -> Vec<(Id, T)> {
        self.members
            .iter()
            .filter_map(|id| tunnel_finder(*id).map(|t| (*id, t)))
            .collect_vec()
    }

    /// Closes an operative's tunnel if one is live
    ///
    /// Used on removal so a departing operative's connection is not left
    /// dangling.
    pub fn close_session<T: Tunnel, F: Fn(Id) -> Option<T>>(member: Id, tunnel_finder: F) {
        if let Some(tunnel) = tunnel_finder(member) {
            tunnel.close();
        }
    }

    /// Sends an update message to a specific member
    ///
    /// Silently does nothing for non-members or members without a live
    /// tunnel.
    pub fn send_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        member: Id,
        tunnel_finder: F,
    ) {
        if !self.members.contains(&member) {
            return;
        }
        let Some(tunnel) = tunnel_finder(member) else {
            return;
        };

        tunnel.send_message(message);
    }

    /// Sends a state synchronization message to a specific member
    pub fn send_state<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &SyncMessage,
        member: Id,
        tunnel_finder: F,
    ) {
        if !self.members.contains(&member) {
            return;
        }
        let Some(tunnel) = tunnel_finder(member) else {
            return;
        };

        tunnel.send_state(message);
    }

    /// Sends personalized messages to all connected members
    ///
    /// The sender function is called for each member and can return a
    /// different message per member, or `None` to skip them.
    pub fn announce_with<S, T: Tunnel, F: Fn(Id) -> Option<T>>(&self, sender: S, tunnel_finder: F)
    where
        S: Fn(Id) -> Option<UpdateMessage>,
    {
        for (member, tunnel) in self.vec(tunnel_finder) {
            let Some(message) = sender(member) else {
                continue;
            };

            tunnel.send_message(&message);
        }
    }

    /// Broadcasts an update message to every connected member
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        self.announce_with(|_| Some(message.to_owned()), tunnel_finder);
    }
}
