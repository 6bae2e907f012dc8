//! # Dongle Picker
//!
//! The interactive half of dongle: a catalog of candidate directories, a
//! pure state machine driven by key input, and a ratatui renderer drawing on
//! the controlling terminal.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Dongle Picker                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DirectoryIndex(es) ──► Catalog ──► PickerState ──► render      │
//! │                                         ▲                       │
//! │                         key ──► Input ──┘                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition takes the current [`PickerState`] by reference and
//! returns a new one plus a [`Render`] instruction, so the state machine can be
//! tested without a terminal.

pub mod catalog;
pub mod error;
pub mod render;
pub mod state;
pub mod terminal;

pub use catalog::{Catalog, CatalogItem, Mode};
pub use error::{PickerError, Result};
pub use render::home_relative;
pub use state::{
    DEFAULT_VIEWPORT_HEIGHT, Edit, Input, MAX_RESULTS, Move, Phase, PickerState, Render, Transition,
};
pub use terminal::{Outcome, PickerOptions, input_for_key, run};
