//! Drawing picker state with ratatui.

use std::path::Path;

use ratatui::Frame;
use ratatui::layout::Position;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::catalog::Catalog;
use crate::state::PickerState;

/// Rows above the result list: title, key hints, prompt, divider.
pub const CHROME_ROWS: usize = 4;

const ACCENT: Color = Color::Rgb(0x5f, 0x87, 0xff);
const MATCH: Color = Color::Rgb(0x5f, 0xff, 0x87);
const SELECTED_BG: Color = Color::Rgb(0x1e, 0x3a, 0x5f);
const MUTED: Color = Color::Rgb(0x66, 0x66, 0x66);
const PREFIX: Color = Color::Rgb(0x88, 0x88, 0x88);
const DIVIDER: Color = Color::Rgb(0x33, 0x33, 0x33);
const NO_RESULTS: Color = Color::Rgb(0xff, 0x55, 0x55);

const PROMPT: &str = "  / ";
const SELECTED_MARKER: &str = "  ❯ ";
const UNSELECTED_MARKER: &str = "    ";

/// `path` with the home directory shown as `~`.
pub fn home_relative(path: &Path) -> String {
    relative_to(path, dirs::home_dir().as_deref())
}

fn relative_to(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}

/// Draw the whole picker into the frame and place the cursor on the prompt.
pub fn draw(frame: &mut Frame, catalog: &Catalog, state: &PickerState, title: &str) {
    let area = frame.area();
    frame.render_widget(Paragraph::new(lines(catalog, state, title, area.width)), area);

    let prompt = prompt_line(state.query());
    let x = area.x.saturating_add(u16::try_from(prompt.width()).unwrap_or(u16::MAX));
    if area.height > 2 {
        frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y + 2));
    }
}

/// All lines of the picker, top to bottom.
pub fn lines(catalog: &Catalog, state: &PickerState, title: &str, width: u16) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Dongle", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  in {title}"), Style::default().fg(MUTED)),
            Span::styled(
                format!("  {}/{}", state.results().len(), catalog.len()),
                Style::default().fg(DIVIDER),
            ),
        ]),
        Line::styled(
            "  ↑↓ navigate  Enter select  Esc cancel",
            Style::default().fg(DIVIDER),
        ),
        prompt_line(state.query()),
        Line::styled("─".repeat(usize::from(width)), Style::default().fg(DIVIDER)),
    ];

    if state.results().is_empty() {
        lines.push(Line::styled(
            "  No results found",
            Style::default().fg(NO_RESULTS).add_modifier(Modifier::ITALIC),
        ));
        return lines;
    }

    for (position, matched) in state.visible() {
        let Some(item) = catalog.item(matched.index) else {
            continue;
        };
        lines.push(result_line(
            item.display(),
            &matched.positions,
            position == state.cursor(),
        ));
    }
    lines
}

fn prompt_line(query: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(MATCH).add_modifier(Modifier::BOLD)),
        Span::raw(query.to_string()),
    ])
}

/// One result row. The last path segment is emphasised and matched
/// characters are highlighted.
fn result_line(display: &str, positions: &[usize], selected: bool) -> Line<'static> {
    let base = if selected {
        Style::default().bg(SELECTED_BG).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let name_start = display
        .chars()
        .enumerate()
        .filter(|(_, c)| *c == '/')
        .last()
        .map_or(0, |(i, _)| i + 1);

    let style_at = |i: usize| {
        if positions.binary_search(&i).is_ok() {
            base.fg(MATCH).add_modifier(Modifier::BOLD)
        } else if i >= name_start {
            base.fg(Color::White)
        } else {
            base.fg(PREFIX)
        }
    };

    let marker = if selected {
        SELECTED_MARKER
    } else {
        UNSELECTED_MARKER
    };
    let mut spans = vec![Span::styled(marker, base.fg(MATCH))];
    let mut run = String::new();
    let mut run_style = None;
    for (i, c) in display.chars().enumerate() {
        let style = style_at(i);
        if let Some(current) = run_style.filter(|current| *current != style) {
            spans.push(Span::styled(std::mem::take(&mut run), current));
        }
        run_style = Some(style);
        run.push(c);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Edit, Move};
    use dongle_index::{DirectoryIndex, IndexEntry, ScanParams};
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn catalog(paths: &[String]) -> Catalog {
        let entries = paths
            .iter()
            .map(|path| IndexEntry::new(path.split('/')))
            .collect();
        Catalog::single(&DirectoryIndex::new("/work", ScanParams::default(), entries))
    }

    fn screen(catalog: &Catalog, state: &PickerState, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(48, height)).unwrap();
        terminal
            .draw(|frame| draw(frame, catalog, state, "~/work"))
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..48u16)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_home_is_abbreviated() {
        let home = Path::new("/home/me");

        assert_eq!(relative_to(Path::new("/home/me"), Some(home)), "~");
        assert_eq!(relative_to(Path::new("/home/me/work/app"), Some(home)), "~/work/app");
        assert_eq!(relative_to(Path::new("/home/meadow"), Some(home)), "/home/meadow");
        assert_eq!(relative_to(Path::new("/srv"), None), "/srv");
    }

    #[test]
    fn test_draws_header_prompt_and_rows() {
        let catalog = catalog(&["src".into(), "src/ui".into(), "docs".into()]);
        let state = PickerState::new(&catalog, 5)
            .on_edit(&catalog, Edit::Insert('s'))
            .state;

        let lines = screen(&catalog, &state, 10);

        assert!(lines[0].starts_with("  Dongle  in ~/work"));
        assert!(lines[0].ends_with("3/4"));
        assert_eq!(lines[2], "  / s");
        assert!(lines[3].starts_with("────"));
        assert_eq!(lines[4], "  ❯ src");
        assert_eq!(lines[5], "    src/ui");
        assert_eq!(lines[6], "    docs");
    }

    #[test]
    fn test_draws_only_the_viewport_window() {
        let paths: Vec<String> = (0..50).map(|i| format!("dir{i:02}")).collect();
        let catalog = catalog(&paths);
        let state = (0..49).fold(PickerState::new(&catalog, 10), |state, _| {
            state.on_move(Move::Next).state
        });

        let lines = screen(&catalog, &state, 16);

        // Row 0 is the root, so the cursor sits on dir48.
        assert_eq!(lines[4], "    dir39");
        assert_eq!(lines[13], "  ❯ dir48");
        assert_eq!(lines[14], "");
    }

    #[test]
    fn test_draws_empty_result_notice() {
        let catalog = catalog(&["src".into()]);
        let state = PickerState::new(&catalog, 5)
            .on_edit(&catalog, Edit::Insert('z'))
            .state;

        let lines = screen(&catalog, &state, 8);

        assert_eq!(lines[4], "  No results found");
    }

    #[test]
    fn test_matched_characters_are_highlighted() {
        let line = result_line("src/ui", &[4, 5], false);

        let highlighted: String = line
            .spans
            .iter()
            .filter(|span| span.style.fg == Some(MATCH) && span.content != UNSELECTED_MARKER)
            .map(|span| span.content.to_string())
            .collect();
        assert_eq!(highlighted, "ui");
    }

    #[test]
    fn test_selected_row_has_background() {
        let line = result_line("src", &[], true);

        assert!(line.spans.iter().all(|span| span.style.bg == Some(SELECTED_BG)));
    }
}
