//! # Dongle Fuzzy
//!
//! Case-insensitive fuzzy ranking of path strings.
//!
//! A candidate matches when every query character appears in it in order.
//! Contiguous (substring) matches always outrank scattered (subsequence)
//! matches; within a tier the weights in [`score`] decide.
//!
//! ```rust
//! use dongle_fuzzy::rank;
//!
//! let paths = ["src/components/ui", "tests/components", "docs"];
//! let ranked = rank(&paths, "comp", 10);
//! assert_eq!(ranked.len(), 2);
//! ```

pub mod rank;
pub mod score;

pub use rank::{FuzzyMatch, rank};
pub use score::{MatchKind, Query, Score};
