//! Running a picker session on the controlling terminal.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;

use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::{PickerError, Result};
use crate::render::{self, CHROME_ROWS};
use crate::state::{DEFAULT_VIEWPORT_HEIGHT, Edit, Input, Move, Phase, PickerState, Render};

const TTY_PATH: &str = "/dev/tty";

/// Presentation options for [`run`].
#[derive(Debug, Clone)]
pub struct PickerOptions {
    /// Shown in the header, usually the root with `~` for home.
    pub title: String,

    /// Preferred number of result rows. Shrunk to fit the terminal.
    pub viewport: usize,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            viewport: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl PickerOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed(PathBuf),
    Cancelled,
}

/// Map a key press to picker input. Unbound keys yield `None`.
pub fn input_for_key(key: KeyEvent) -> Option<Input> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let input = match key.code {
        KeyCode::Enter => Input::Commit,
        KeyCode::Esc => Input::Cancel,
        KeyCode::Char('c' | 'g') if ctrl => Input::Cancel,
        KeyCode::Char('p') if ctrl => Input::Move(Move::Previous),
        KeyCode::Char('n') if ctrl => Input::Move(Move::Next),
        KeyCode::Char('u') if ctrl => Input::Edit(Edit::Clear),
        KeyCode::Char('w') if ctrl => Input::Edit(Edit::DeleteWord),
        KeyCode::Char(_) if ctrl || alt => return None,
        KeyCode::Char(c) => Input::Edit(Edit::Insert(c)),
        KeyCode::Backspace => Input::Edit(Edit::Backspace),
        KeyCode::Up | KeyCode::BackTab => Input::Move(Move::Previous),
        KeyCode::Down | KeyCode::Tab => Input::Move(Move::Next),
        KeyCode::PageUp => Input::Move(Move::PageUp),
        KeyCode::PageDown => Input::Move(Move::PageDown),
        KeyCode::Home => Input::Move(Move::First),
        KeyCode::End => Input::Move(Move::Last),
        _ => return None,
    };
    Some(input)
}

/// Run an interactive session over `catalog` until the user commits or
/// cancels.
///
/// All drawing and input goes through `/dev/tty`, so standard output stays
/// free for the caller. The session uses the terminal's alternate screen and
/// restores the original screen on exit.
pub fn run(catalog: &Catalog, options: &PickerOptions) -> Result<Outcome> {
    let tty = OpenOptions::new()
        .read(true)
        .write(true)
        .open(TTY_PATH)
        .map_err(PickerError::NoTerminal)?;

    let guard = ScreenGuard::enter(tty.try_clone()?)?;
    let result = session(CrosstermBackend::new(tty), catalog, options);
    drop(guard);

    let state = result?;
    debug!("picker finished with {:?}", state.phase());
    Ok(match state.phase() {
        Phase::Committed(path) => Outcome::Committed(path.clone()),
        _ => Outcome::Cancelled,
    })
}

fn session<B: Backend>(backend: B, catalog: &Catalog, options: &PickerOptions) -> Result<PickerState> {
    let mut terminal = Terminal::new(backend)?;
    let rows = terminal.size()?.height;
    let mut state = PickerState::new(catalog, viewport_rows(rows, options.viewport));
    terminal.draw(|frame| render::draw(frame, catalog, &state, &options.title))?;

    loop {
        let transition = match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => match input_for_key(key) {
                Some(input) => state.apply(catalog, input),
                None => continue,
            },
            Event::Resize(_, rows) => state.on_resize(viewport_rows(rows, options.viewport)),
            _ => continue,
        };

        state = transition.state;
        match transition.render {
            Render::Redraw => {
                terminal.draw(|frame| render::draw(frame, catalog, &state, &options.title))?;
            }
            Render::Unchanged => {}
            Render::Finish => return Ok(state),
        }
    }
}

/// Result rows that fit under the header on a terminal `rows` tall.
fn viewport_rows(rows: u16, preferred: usize) -> usize {
    usize::from(rows)
        .saturating_sub(CHROME_ROWS)
        .min(preferred)
        .max(1)
}

/// Raw mode plus alternate screen for the lifetime of a session.
struct ScreenGuard {
    tty: File,
}

impl ScreenGuard {
    fn enter(mut tty: File) -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(err) = execute!(tty, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(Self { tty })
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.tty, Show, LeaveAlternateScreen) {
            warn!("Failed to restore the terminal screen: {}", err);
        }
        if let Err(err) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", err);
        }
    }
}
