//! Communication session management
//!
//! This module defines the trait for tunneling messages between the squad
//! authority and connected operatives. The tunnel abstraction allows for
//! different communication mechanisms while maintaining a consistent
//! interface; the engine only assumes ordered, reliable delivery over a
//! persistent connection, owed by the implementation.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages through a communication tunnel
///
/// This trait abstracts the communication mechanism used to send messages
/// to a connected operative. Implementations might use WebSockets,
/// Server-Sent Events, or other real-time communication protocols.
pub trait Tunnel {
    /// Sends an update message to the operative
    ///
    /// Update messages notify the operative about changes that affect
    /// their current view, such as a clue reveal, a guess verdict, or a
    /// squad-wide stage transition.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a state synchronization message to the operative
    ///
    /// Sync messages carry the current authoritative state rather than an
    /// incremental event. They are used when an operative connects or
    /// reconnects and must catch up on transitions they missed.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Closes the communication tunnel
    ///
    /// This method should be called when the operative disconnects or
    /// when the communication is no longer needed.
    fn close(self);
}
