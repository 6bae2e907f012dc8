//! Picker session state machine.
//!
//! ```text
//!   Idle ──char──► Filtering ──backspace to empty──► Idle
//!    │                │
//!    ├──commit────────┼──► Committed(path)
//!    └──cancel────────┴──► Cancelled
//! ```

use std::path::PathBuf;

use dongle_fuzzy::FuzzyMatch;

use crate::catalog::{Catalog, Mode};

/// Most ranked results kept per query.
pub const MAX_RESULTS: usize = 500;

/// Rows shown when the caller does not choose a height.
pub const DEFAULT_VIEWPORT_HEIGHT: usize = 12;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Empty query, unfiltered list.
    Idle,

    /// Non-empty query, ranked subset.
    Filtering,

    /// The user chose this absolute path.
    Committed(PathBuf),

    /// The user backed out.
    Cancelled,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed(_) | Self::Cancelled)
    }
}

/// Changes to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Insert(char),
    Backspace,
    DeleteWord,
    Clear,
}

/// Cursor movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Next,
    Previous,
    PageDown,
    PageUp,
    First,
    Last,
}

/// One unit of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Edit(Edit),
    Move(Move),
    Commit,
    Cancel,
}

/// What the presentation loop should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// Draw the new state.
    Redraw,

    /// Nothing visible changed.
    Unchanged,

    /// The session ended; tear down the display.
    Finish,
}

/// A new state plus the render instruction that goes with it.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: PickerState,
    pub render: Render,
}

/// Snapshot of one picker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerState {
    query: String,
    cursor: usize,
    scroll: usize,
    viewport: usize,
    results: Vec<FuzzyMatch>,
    mode: Mode,
    phase: Phase,
}

impl PickerState {
    /// Start a session showing the first page of `catalog` in scan order.
    pub fn new(catalog: &Catalog, viewport: usize) -> Self {
        Self {
            query: String::new(),
            cursor: 0,
            scroll: 0,
            viewport: viewport.max(1),
            results: catalog.rank("", MAX_RESULTS),
            mode: catalog.mode(),
            phase: Phase::Idle,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn results(&self) -> &[FuzzyMatch] {
        &self.results
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The result under the cursor.
    pub fn selected(&self) -> Option<&FuzzyMatch> {
        self.results.get(self.cursor)
    }

    /// Results inside the viewport, with their positions in the full list.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &FuzzyMatch)> {
        self.results
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.viewport)
    }

    /// Dispatch `input` to its transition.
    pub fn apply(&self, catalog: &Catalog, input: Input) -> Transition {
        match input {
            Input::Edit(edit) => self.on_edit(catalog, edit),
            Input::Move(movement) => self.on_move(movement),
            Input::Commit => self.on_commit(catalog),
            Input::Cancel => self.on_cancel(),
        }
    }

    /// Change the query, re-rank the whole catalog and reset the cursor.
    pub fn on_edit(&self, catalog: &Catalog, edit: Edit) -> Transition {
        if self.phase.is_terminal() {
            return self.unchanged();
        }

        let mut query = self.query.clone();
        match edit {
            Edit::Insert(c) => query.push(c),
            Edit::Backspace => {
                query.pop();
            }
            Edit::DeleteWord => {
                let kept = query.trim_end_matches(is_word_separator);
                let keep = kept.trim_end_matches(|c: char| !is_word_separator(c)).len();
                query.truncate(keep);
            }
            Edit::Clear => query.clear(),
        }
        if query == self.query {
            return self.unchanged();
        }

        let phase = if query.is_empty() {
            Phase::Idle
        } else {
            Phase::Filtering
        };
        let results = catalog.rank(&query, MAX_RESULTS);
        Transition {
            state: Self {
                query,
                cursor: 0,
                scroll: 0,
                results,
                phase,
                ..self.clone()
            },
            render: Render::Redraw,
        }
    }

    /// Move the cursor within the results, scrolling as little as needed.
    pub fn on_move(&self, movement: Move) -> Transition {
        if self.phase.is_terminal() || self.results.is_empty() {
            return self.unchanged();
        }

        let last = self.results.len() - 1;
        let cursor = match movement {
            Move::Next => self.cursor.saturating_add(1),
            Move::Previous => self.cursor.saturating_sub(1),
            Move::PageDown => self.cursor.saturating_add(self.viewport),
            Move::PageUp => self.cursor.saturating_sub(self.viewport),
            Move::First => 0,
            Move::Last => last,
        }
        .min(last);
        if cursor == self.cursor {
            return self.unchanged();
        }

        let scroll = if cursor < self.scroll {
            cursor
        } else if cursor >= self.scroll + self.viewport {
            cursor + 1 - self.viewport
        } else {
            self.scroll
        };

        Transition {
            state: Self {
                cursor,
                scroll,
                ..self.clone()
            },
            render: Render::Redraw,
        }
    }

    /// Change how many rows are shown, keeping the cursor visible.
    pub fn on_resize(&self, viewport: usize) -> Transition {
        let viewport = viewport.max(1);
        let scroll = if self.cursor >= self.scroll + viewport {
            self.cursor + 1 - viewport
        } else {
            self.scroll
        };

        Transition {
            state: Self {
                viewport,
                scroll,
                ..self.clone()
            },
            render: Render::Redraw,
        }
    }

    /// Commit the result under the cursor. Ignored when nothing matches.
    pub fn on_commit(&self, catalog: &Catalog) -> Transition {
        if self.phase.is_terminal() {
            return self.unchanged();
        }
        let Some(path) = self.selected().and_then(|m| catalog.resolve(m.index)) else {
            return self.unchanged();
        };

        Transition {
            state: Self {
                phase: Phase::Committed(path),
                ..self.clone()
            },
            render: Render::Finish,
        }
    }

    /// End the session without a result.
    pub fn on_cancel(&self) -> Transition {
        if self.phase.is_terminal() {
            return self.unchanged();
        }

        Transition {
            state: Self {
                phase: Phase::Cancelled,
                ..self.clone()
            },
            render: Render::Finish,
        }
    }

    fn unchanged(&self) -> Transition {
        Transition {
            state: self.clone(),
            render: Render::Unchanged,
        }
    }
}

fn is_word_separator(c: char) -> bool {
    matches!(c, '/' | '_' | '-' | '.' | ' ')
}
