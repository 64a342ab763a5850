//! Source pane rendering with syntax highlighting
//!
//! This module renders the page being stepped through with basic syntax
//! highlighting, the current line, and a results column on the right that
//! shows what each executed line evaluated to (or printed).
//!
//! # Features
//!
//! - Syntax highlighting for keywords, type names, strings, numbers and comments
//! - Current line highlighting; the line that raised an error is drawn in the
//!   error colour once the trace reaches its end
//! - A scroll state that keeps the current line at a fixed row while stepping
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring a full lexer.

use crate::snapshot::Snapshot;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use rustc_hash::FxHashMap;

/// Widest the code column gets before results start
const MAX_CODE_WIDTH: usize = 60;

/// Simple syntax highlighting for lesson code
fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Comments and annotations run to the end of the line
        if c == '/' && i + 1 < chars.len() && matches!(chars[i + 1], '/' | '*') {
            if !current_word.is_empty() {
                spans.push(Span::raw(current_word.clone()));
                current_word.clear();
            }
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' {
            if !current_word.is_empty() {
                spans.push(Span::raw(current_word.clone()));
                current_word.clear();
            }
            let mut end = i + 1;
            while end < chars.len() && chars[end] != '"' {
                if chars[end] == '\\' {
                    end += 2;
                } else {
                    end += 1;
                }
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        // Delimiters end the current word
        if !c.is_alphanumeric() && c != '_' {
            if !current_word.is_empty() {
                let is_func = c == '(';
                let style = get_keyword_style(&current_word, is_func);
                spans.push(Span::styled(current_word.clone(), style));
                current_word.clear();
            }

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary),
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    if !current_word.is_empty() {
        let style = get_keyword_style(&current_word, false);
        spans.push(Span::styled(current_word, style));
    }

    Line::from(spans)
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "let" | "var" | "func" | "struct" | "return" | "if" | "else" | "while" | "repeat"
        | "for" | "in" | "break" | "continue" | "self" => Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD),
        "true" | "false" => Style::default().fg(DEFAULT_THEME.number),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => Style::default().fg(DEFAULT_THEME.number),
        _ if word.starts_with(|c: char| c.is_uppercase()) => Style::default().fg(DEFAULT_THEME.type_name),
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg),
    }
}

/// Sidebar text per line for everything executed up to `position`.
/// A line that ran more than once shows its latest result.
pub fn sidebar_results(trace: &[Snapshot], position: usize) -> FxHashMap<usize, String> {
    let mut results = FxHashMap::default();
    for snapshot in trace.iter().take(position + 1) {
        if let Some(result) = &snapshot.result {
            results.insert(snapshot.source_location.line, result.clone());
        }
    }
    results
}

/// Scroll state for the source pane
#[derive(Debug, Default)]
pub struct SourceScrollState {
    pub offset: usize,
    /// Visual row the current line is kept at; `None` until first render
    pub target_line_row: Option<usize>,
}

/// Data needed to render the source pane
pub struct SourceRenderData<'a> {
    pub source: &'a str,
    pub current_line: Option<usize>,
    pub error_line: Option<usize>,
    pub sidebar: &'a FxHashMap<usize, String>,
}

/// Render the source pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = data.source.lines().collect();
    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current (or failing) line at the target row
    let focus_line = data.error_line.or(data.current_line).unwrap_or(0);
    if focus_line > 0 && focus_line <= total_lines {
        scroll_state.offset = (focus_line - 1).saturating_sub(target_row);
    }
    scroll_state.offset = scroll_state
        .offset
        .min(total_lines.saturating_sub(visible_height));

    let code_width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_CODE_WIDTH);

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = data.error_line == Some(line_num);
            let is_current = data.current_line == Some(line_num);

            let (num_style, content_base_style) = if is_error {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
            } else if is_current {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Style::default().bg(DEFAULT_THEME.current_line_bg),
                )
            } else {
                (Style::default().fg(DEFAULT_THEME.comment), Style::default())
            };

            let mut content_line = highlight_source_code(line);
            if is_error {
                for span in &mut content_line.spans {
                    span.style = content_base_style;
                }
            } else if is_current {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(content_base_style);
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content_line.spans);

            if let Some(result) = data.sidebar.get(&line_num) {
                let padding = code_width.saturating_sub(line.chars().count()) + 2;
                spans.push(Span::raw(" ".repeat(padding)));
                spans.push(Span::styled(
                    format!("│ {}", result),
                    Style::default().fg(DEFAULT_THEME.sidebar),
                ));
            }

            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
