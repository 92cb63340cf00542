//! Client-side state machines
//!
//! Each operative's device runs a single-threaded, event-driven loop: a UI
//! event or an inbound server message is fed into one of the machines here,
//! which mutates its own state and hands back a list of effects for the
//! embedding runtime to carry out (send a request, fire a feedback signal,
//! push a navigation frame). The machines never touch the transport or the
//! presentation layer themselves, which keeps every contract testable
//! without a live network.
//!
//! Session-wide client state lives in [`context::SessionContext`], an owned
//! value the runtime passes by reference to whichever machine needs it,
//! deliberately not a process-wide singleton.

pub mod context;
pub mod guard;
pub mod jammer;
