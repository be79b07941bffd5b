use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::InteractivePicker;

/// Theme colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(217, 119, 87),
            dim: Color::Rgb(100, 100, 100),
        }
    }
}

/// Result of feeding a key to the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Accept(Option<String>),
    Cancel,
}

/// State of the built-in picker: query, filtered matches and selection
pub struct PickerState {
    candidates: Vec<String>,
    /// Indices into `candidates` matching the current query
    matches: Vec<usize>,
    pub query: String,
    pub list_state: ListState,
    theme: Theme,
}

/// Case-insensitive subsequence match.
pub fn fuzzy_match(query: &str, candidate: &str) -> bool {
    let mut haystack = candidate.chars().flat_map(char::to_lowercase);
    query
        .chars()
        .flat_map(char::to_lowercase)
        .all(|q| haystack.any(|c| c == q))
}

impl PickerState {
    pub fn new(candidates: Vec<String>) -> Self {
        let mut state = Self {
            matches: Vec::new(),
            candidates,
            query: String::new(),
            list_state: ListState::default(),
            theme: Theme::default(),
        };
        state.refilter();
        state
    }

    #[cfg(test)]
    pub fn matches(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|&i| self.candidates[i].as_str())
    }

    pub fn selected(&self) -> Option<&str> {
        self.list_state
            .selected()
            .and_then(|i| self.matches.get(i))
            .map(|&i| self.candidates[i].as_str())
    }

    fn refilter(&mut self) {
        self.matches = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| fuzzy_match(&self.query, c))
            .map(|(i, _)| i)
            .collect();
        self.list_state
            .select(if self.matches.is_empty() { None } else { Some(0) });
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return KeyOutcome::Cancel,
            KeyCode::Char('c') if ctrl => return KeyOutcome::Cancel,
            KeyCode::Enter => return KeyOutcome::Accept(self.selected().map(str::to_string)),
            KeyCode::Down => self.next(),
            KeyCode::Up => self.previous(),
            KeyCode::Char('n') if ctrl => self.next(),
            KeyCode::Char('p') if ctrl => self.previous(),
            KeyCode::Backspace => {
                self.query.pop();
                self.refilter();
            }
            KeyCode::Char(c) if !ctrl => {
                self.query.push(c);
                self.refilter();
            }
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.matches.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.matches.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Query
                Constraint::Min(0),    // Matches
                Constraint::Length(1), // Footer
            ])
            .split(frame.area());

        self.render_query(frame, chunks[0]);
        self.render_list(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_query(&self, frame: &mut Frame, area: Rect) {
        let prompt = Paragraph::new(Line::from(vec![
            Span::styled("▶ ", Style::default().fg(self.theme.accent)),
            Span::styled(
                format!("{}_", self.query),
                Style::default()
                    .fg(self.theme.fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(prompt, area);
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = if self.matches.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "  No matches",
                Style::default().fg(self.theme.dim),
            )))]
        } else {
            self.matches
                .iter()
                .map(|&i| {
                    ListItem::new(Line::from(Span::styled(
                        self.candidates[i].as_str(),
                        Style::default().fg(self.theme.fg),
                    )))
                })
                .collect()
        };

        let title = format!(" {}/{} ", self.matches.len(), self.candidates.len());
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.dim)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 50))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help = Paragraph::new(Line::from(Span::styled(
            " Enter: Select │ ↑/↓: Navigate │ Esc: Cancel ",
            Style::default().fg(self.theme.dim),
        )));
        frame.render_widget(help, area);
    }
}

/// Full-screen picker drawn with ratatui, used when no external picker is available.
pub struct BuiltinPicker;

impl BuiltinPicker {
    fn run(candidates: Vec<String>) -> Result<Option<String>> {
        let mut state = PickerState::new(candidates);
        let mut terminal = ratatui::init();

        let result = loop {
            if let Err(e) = terminal.draw(|f| state.render(f)) {
                break Err(e.into());
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match state.handle_key(key) {
                        KeyOutcome::Continue => {}
                        KeyOutcome::Accept(choice) => break Ok(choice),
                        KeyOutcome::Cancel => break Ok(None),
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }
        };

        // Restore terminal
        ratatui::restore();
        result
    }
}

impl InteractivePicker for BuiltinPicker {
    async fn pick(&self, candidates: &[String]) -> Result<Option<String>> {
        let candidates = candidates.to_vec();
        tokio::task::spawn_blocking(move || Self::run(candidates))
            .await
            .context("Built-in picker panicked")?
    }
}
