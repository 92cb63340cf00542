//! Squad ID generation and management
//!
//! This module provides functionality for generating and managing unique
//! squad IDs that identify a crew for the lifetime of its session. Squad IDs
//! are displayed in octal format to make them easier to communicate verbally
//! over voice chat while the crew assembles.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Minimum value for generated squad IDs (in octal: 10000)
const MIN_VALUE: u16 = 0o10_000;
/// Maximum value for generated squad IDs (in octal: 100000)
const MAX_VALUE: u16 = 0o100_000;

/// A unique identifier for a squad
///
/// Squad IDs are generated randomly within a specific range and displayed
/// in octal format. The octal format keeps every ID at five digits and
/// reduces confusion when crews share IDs verbally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SquadId(u16);

impl SquadId {
    /// Creates a new random squad ID
    ///
    /// The ID is generated within the valid range to ensure it displays
    /// as a 5-digit octal number for easy communication.
    pub fn new() -> Self {
        Self(fastrand::u16(MIN_VALUE..MAX_VALUE))
    }
}

impl Default for SquadId {
    /// Creates a new random squad ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SquadId {
    /// Formats the squad ID as a 5-digit octal number
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05o}", self.0)
    }
}

impl Serialize for SquadId {
    /// Serializes the squad ID as an octal string
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SquadId {
    /// Deserializes a squad ID from an octal string
    fn deserialize<D>(deserializer: D) -> Result<SquadId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SquadId::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl FromStr for SquadId {
    type Err = ParseIntError;

    /// Parses a squad ID from an octal string representation
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string cannot be parsed as a valid
    /// octal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(u16::from_str_radix(s, 8)?))
    }
}
