use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io::stdout;
use tui_input::{Input, InputRequest};

use crate::{
    highlight::{Segment, SegmentKind},
    session::Session,
};

const TAB: &str = "    ";

/// Full-screen reader: the active document with a live search box.
pub struct ViewerApp {
    session: Session,
    input: Input,
    scroll: usize,
    viewport_height: usize,
    recenter: bool,
}

impl ViewerApp {
    pub fn new(session: Session) -> Self {
        let input = Input::new(session.query().to_string());
        Self {
            session,
            input,
            scroll: 0,
            viewport_height: 0,
            recenter: true,
        }
    }

    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_app(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    fn run_app(&mut self, terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !self.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }

    /// Apply one key press. Returns false when the viewer should close.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let request = match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Down | KeyCode::Enter => {
                self.session.next_match();
                self.recenter = true;
                return true;
            }
            KeyCode::Up => {
                self.session.prev_match();
                self.recenter = true;
                return true;
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(self.viewport_height.max(1));
                return true;
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(self.viewport_height.max(1));
                return true;
            }
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return true,
        };

        if let Some(change) = self.input.handle(request) {
            if change.value {
                self.session.set_query(self.input.value());
                self.recenter = true;
            }
        }
        true
    }

    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Length(3), // Search box
                    Constraint::Min(0),    // Document
                    Constraint::Length(2), // Status bar
                ]
                .as_ref(),
            )
            .split(f.size());

        self.draw_search_box(f, chunks[0]);
        self.draw_document(f, chunks[1]);
        self.draw_status_bar(f, chunks[2]);
    }

    fn draw_search_box(&self, f: &mut Frame, area: Rect) {
        let title = match self.session.position_label() {
            Some(label) => format!("Search ({})", label),
            None if self.session.query().trim().is_empty() => "Search".to_string(),
            None => "Search (No matches)".to_string(),
        };

        let cursor = self.input.cursor();
        let scroll = input_scroll(cursor, area.width.saturating_sub(2) as usize);
        let input = Paragraph::new(self.input.value())
            .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(input, area);

        f.set_cursor(
            area.x + (cursor - scroll) as u16 + 1,
            area.y + 1,
        );
    }

    fn draw_document(&mut self, f: &mut Frame, area: Rect) {
        let Some(doc) = self.session.active() else {
            let empty = Paragraph::new("No document loaded.")
                .block(Block::default().title("Document").borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        };
        let title = format!("{} [{}]", doc.name, doc.format);

        let width = area.width.saturating_sub(2).max(1) as usize;
        let height = area.height.saturating_sub(2) as usize;
        let wrapped = wrap_segments(&self.session.segments(), width);

        self.viewport_height = height;
        if self.recenter {
            if let Some(row) = wrapped.active_row {
                self.scroll = row.saturating_sub(height / 2);
            }
            self.recenter = false;
        }
        self.scroll = self.scroll.min(wrapped.lines.len().saturating_sub(1));

        // rows are skipped here since Paragraph::scroll takes a u16 offset
        let visible: Vec<Line> = wrapped
            .lines
            .into_iter()
            .skip(self.scroll)
            .take(height)
            .collect();
        let paragraph = Paragraph::new(visible).block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let keys = Line::from(vec![
            Span::styled("Enter/↓", Style::default().fg(Color::Yellow)),
            Span::raw(" next  "),
            Span::styled("↑", Style::default().fg(Color::Yellow)),
            Span::raw(" previous  "),
            Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
            Span::raw(" scroll  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ]);

        let status = Paragraph::new(keys).block(Block::default().borders(Borders::TOP));
        f.render_widget(status, area);
    }
}

fn match_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightRed)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    }
}

/// Horizontal scroll that keeps the input cursor inside a box `width`
/// columns wide.
fn input_scroll(cursor: usize, width: usize) -> usize {
    cursor.saturating_sub(width.saturating_sub(1))
}

/// Document rows hard-wrapped to the viewer width.
struct WrappedText {
    lines: Vec<Line<'static>>,
    /// Row holding the start of the active match.
    active_row: Option<usize>,
}

struct LineBuilder {
    width: usize,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    col: usize,
}

impl LineBuilder {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            lines: Vec::new(),
            current: Vec::new(),
            col: 0,
        }
    }

    /// Append text to the current row, wrapping at the width. Returns the
    /// row the text starts on, or None for empty text.
    fn push(&mut self, text: &str, style: Style) -> Option<usize> {
        let text = text.replace('\r', "").replace('\t', TAB);
        let mut rest = text.as_str();
        let mut first_row = None;

        while !rest.is_empty() {
            if self.col == self.width {
                self.break_line();
            }
            let room = self.width - self.col;
            let split = rest.char_indices().nth(room).map_or(rest.len(), |(i, _)| i);
            let (head, tail) = rest.split_at(split);

            first_row.get_or_insert(self.lines.len());
            self.current.push(Span::styled(head.to_string(), style));
            self.col += head.chars().count();
            rest = tail;
        }
        first_row
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
        self.col = 0;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.lines.push(Line::from(self.current));
        self.lines
    }
}

/// Split highlight segments into display rows, keeping each piece's style.
fn wrap_segments(segments: &[Segment<'_>], width: usize) -> WrappedText {
    let mut builder = LineBuilder::new(width);
    let mut active_row = None;

    for segment in segments {
        let style = match segment.kind {
            SegmentKind::Plain => Style::default(),
            SegmentKind::Match { active, .. } => match_style(active),
        };

        for (i, piece) in segment.text.split('\n').enumerate() {
            if i > 0 {
                builder.break_line();
            }
            let row = builder.push(piece, style);
            if segment.is_active() && active_row.is_none() {
                active_row = row;
            }
        }
    }

    WrappedText {
        lines: builder.finish(),
        active_row,
    }
}
