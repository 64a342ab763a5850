//! Viewer state and event loop

use crate::lesson::{ExecutionResult, LessonUnit};
use crate::snapshot::Snapshot;
use crate::ui::panes::{self, LessonEntry, SourceRenderData, SourceScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

const PLAY_INTERVAL: Duration = Duration::from_millis(600);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Lessons,
    Source,
    Bindings,
    Output,
}

impl FocusedPane {
    /// Move focus to the next pane (lessons -> source -> bindings -> output)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Lessons => FocusedPane::Source,
            FocusedPane::Source => FocusedPane::Bindings,
            FocusedPane::Bindings => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Lessons,
        }
    }
}

/// The main application state
pub struct App {
    pub title: String,
    pub units: Vec<LessonUnit>,
    /// One traced result per unit
    pub results: Vec<ExecutionResult>,

    /// Selected unit
    pub selected: usize,
    /// Position in the selected unit's trace
    pub position: usize,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub lesson_scroll: usize,
    pub source_scroll: SourceScrollState,
    pub bindings_scroll: usize,
    pub output_scroll: usize,

    pub should_quit: bool,
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,
    pub last_play_time: Instant,
    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// `results[i]` must be the traced run of `units[i]`
    pub fn new(title: String, units: Vec<LessonUnit>, results: Vec<ExecutionResult>) -> Self {
        let mut app = App {
            title,
            units,
            results,
            selected: 0,
            position: 0,
            focused_pane: FocusedPane::Lessons,
            lesson_scroll: 0,
            source_scroll: SourceScrollState::default(),
            bindings_scroll: 0,
            output_scroll: 0,
            should_quit: false,
            status_message: String::new(),
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or_else(Instant::now),
        };
        app.select_lesson(0);
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= PLAY_INTERVAL {
                if !self.step_forward() {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn current_result(&self) -> Option<&ExecutionResult> {
        self.results.get(self.selected)
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.current_result()
            .and_then(|result| result.trace.get(self.position))
    }

    fn trace_len(&self) -> usize {
        self.current_result().map_or(0, |result| result.trace.len())
    }

    /// Whether the viewer shows the unit's final state
    pub fn at_end(&self) -> bool {
        self.position + 1 >= self.trace_len()
    }

    fn render(&mut self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(72),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(22),
                Constraint::Percentage(50),
                Constraint::Percentage(28),
            ])
            .split(rows[0]);

        let entries: Vec<LessonEntry> = self
            .units
            .iter()
            .zip(&self.results)
            .map(|(unit, result)| LessonEntry {
                name: &unit.name,
                passed: result.passed(),
                is_exercise: unit.is_exercise,
            })
            .collect();
        panes::render_lesson_list(
            frame,
            columns[0],
            &self.title,
            &entries,
            self.selected,
            self.focused_pane == FocusedPane::Lessons,
            &mut self.lesson_scroll,
        );

        let (Some(unit), Some(result)) = (self.units.get(self.selected), self.results.get(self.selected)) else {
            return;
        };
        let snapshot = result.trace.get(self.position);
        let at_end = self.position + 1 >= result.trace.len();
        let error = result.error.as_ref().filter(|_| at_end);

        let sidebar = panes::sidebar_results(&result.trace, self.position);
        panes::render_source_pane(
            frame,
            columns[1],
            SourceRenderData {
                source: &unit.source,
                current_line: snapshot.map(|s| s.source_location.line),
                error_line: error.and_then(|e| e.line),
                sidebar: &sidebar,
            },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_bindings_pane(
            frame,
            columns[2],
            snapshot.map_or(&[][..], |s| s.bindings.as_slice()),
            snapshot.and_then(|s| s.function.as_deref()),
            snapshot.map_or(0, |s| s.call_depth),
            self.focused_pane == FocusedPane::Bindings,
            &mut self.bindings_scroll,
        );

        let output_len = snapshot.map_or(0, |s| s.output_len).min(result.output.len());
        panes::render_output_pane(
            frame,
            rows[1],
            &result.output[..output_len],
            error,
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        panes::render_status_bar(
            frame,
            rows[2],
            StatusRenderData {
                message: &self.status_message,
                step: self.position,
                total_steps: result.trace.len(),
                failed: !result.passed(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Char('j') => self.select_lesson(self.selected + 1),
            KeyCode::Char('k') => self.select_lesson(self.selected.saturating_sub(1)),
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Lessons => self.select_lesson(self.selected + 1),
                FocusedPane::Source => {
                    // Scrolling down moves the current line up visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Bindings => self.bindings_scroll = self.bindings_scroll.saturating_add(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_add(1),
            },
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Lessons => self.select_lesson(self.selected.saturating_sub(1)),
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Bindings => self.bindings_scroll = self.bindings_scroll.saturating_sub(1),
                FocusedPane::Output => self.output_scroll = self.output_scroll.saturating_sub(1),
            },
            KeyCode::Left => {
                self.is_playing = false;
                if self.step_backward() {
                    self.status_message = "Stepped backward".to_string();
                } else {
                    self.status_message = "Already at the first step".to_string();
                }
            }
            KeyCode::Right => {
                self.is_playing = false;
                if self.step_forward() {
                    self.status_message = "Stepped forward".to_string();
                } else {
                    self.status_message = self.end_message();
                }
            }
            KeyCode::Char(' ') => {
                // Toggle auto-play (debounced against key repeat)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(PLAY_INTERVAL)
                            .unwrap_or_else(Instant::now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.jump_to_end();
                self.status_message = self.end_message();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.jump_to_start();
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    /// Select a unit (clamped) and rewind to its first step
    pub fn select_lesson(&mut self, index: usize) {
        self.selected = index.min(self.units.len().saturating_sub(1));
        self.is_playing = false;
        self.jump_to_start();
        self.bindings_scroll = 0;
        self.source_scroll.target_line_row = None;
        self.status_message = match self.current_result() {
            Some(result) if result.trace_truncated => {
                format!("{} (trace truncated)", result.unit)
            }
            Some(result) => result.unit.clone(),
            None => "No lessons".to_string(),
        };
    }

    /// Advance one step; `false` at the end of the trace
    pub fn step_forward(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.position += 1;
        self.output_scroll = usize::MAX;
        true
    }

    /// Go back one step; `false` at the start
    pub fn step_backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.output_scroll = usize::MAX;
        true
    }

    pub fn jump_to_end(&mut self) {
        self.position = self.trace_len().saturating_sub(1);
        self.output_scroll = usize::MAX;
    }

    pub fn jump_to_start(&mut self) {
        self.position = 0;
        self.output_scroll = usize::MAX;
    }

    fn end_message(&self) -> String {
        match self.current_result() {
            Some(ExecutionResult {
                error: Some(error), ..
            }) => error.to_string(),
            Some(result) if !result.passed() => "Finished, but the lesson failed its checks".to_string(),
            _ => "Finished".to_string(),
        }
    }
}
