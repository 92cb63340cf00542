//! # Heist Game Library
//!
//! This library provides the core coordination logic for the heist party
//! game: squads of operatives work through a fixed sequence of cooperative
//! minigames, and any one operative's success moves the entire squad
//! forward together.
//!
//! The crate is transport-agnostic. Server-side, a [`squad::SquadSession`]
//! is the single authority for a squad's stage and for the live puzzle
//! instance; it talks to operatives through the [`session::Tunnel`] trait
//! and a tunnel-finder closure supplied by the embedding server. Client
//! side, [`client::jammer::JammerView`] and [`client::guard::NavigationGuard`]
//! are explicit state machines driven by discrete events, so every contract
//! is testable without a live network.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]

use serde::Serialize;

pub mod client;
pub mod clues;
pub mod constants;
pub mod jammer;
pub mod roster;
pub mod session;
pub mod squad;
pub mod squad_id;
pub mod stage;

/// Update messages sent to operatives about state changes
///
/// Update messages are incremental: they notify operatives about something
/// that just happened, such as a clue reveal, a guess verdict, or the
/// squad-wide stage transition.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Squad-level messages (stage transitions)
    Squad(squad::UpdateMessage),
    /// Signal jammer puzzle messages
    Jammer(jammer::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages that synchronize an operative's view with the current state
///
/// Sync messages carry a snapshot of the authoritative state rather than an
/// event. They are sent when an operative connects or reconnects and must
/// catch up on anything they missed.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Squad-level state (current stage)
    Squad(squad::SyncMessage),
    /// Signal jammer puzzle state
    Jammer(jammer::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}
