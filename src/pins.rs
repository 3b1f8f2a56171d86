//! GPIO assignments for the radiation node.
//!
//! Single source of truth; adapters reference these constants rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Radiation sensor (Type 5 PIN-photodiode module)
// ---------------------------------------------------------------------------

/// Signal output: one falling edge per detected gamma pulse.
pub const SIG_PIN: i32 = 12;

/// Noise output: goes high while the module is being shaken.
pub const NS_PIN: i32 = 4;
