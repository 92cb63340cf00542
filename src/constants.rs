//! Configuration constants for the heist game system
//!
//! This module contains the configuration limits and defaults used
//! throughout the game system to ensure data integrity and provide
//! consistent boundaries for different game components.

/// Squad membership constants
pub mod squad {
    /// Maximum number of operatives in a single squad
    pub const MAX_SIZE: usize = 8;
}

/// Signal jammer minigame constants
pub mod jammer {
    /// Minimum number of selectable symbols on the jammer grid
    pub const MIN_SYMBOL_COUNT: usize = 2;
    /// Maximum number of selectable symbols on the jammer grid
    pub const MAX_SYMBOL_COUNT: usize = 16;
    /// Symbol count of the standard 3x3 rune grid
    pub const DEFAULT_SYMBOL_COUNT: usize = 9;
    /// Maximum number of clues a single puzzle configuration may carry
    pub const MAX_POOL_SIZE: usize = 32;
    /// Maximum length of a single clue text in bytes
    pub const MAX_CLUE_LENGTH: usize = 200;
    /// Number of tries shown in the "tries remaining" readout
    ///
    /// Display-only: the server never rejects a guess for exceeding it.
    pub const MAX_DISPLAY_TRIES: usize = 8;
    /// Maximum time in seconds the success feedback may linger before the
    /// solver requests the squad advance
    pub const MAX_FEEDBACK_DELAY: u64 = 10;
    /// Default success-feedback linger in milliseconds
    pub const DEFAULT_FEEDBACK_DELAY_MS: u64 = 1500;
}
