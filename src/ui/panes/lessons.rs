//! Lesson list pane

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// One row of the lesson list
pub struct LessonEntry<'a> {
    pub name: &'a str,
    pub passed: bool,
    pub is_exercise: bool,
}

/// Render the lesson list with a pass/fail marker per unit
pub fn render_lesson_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    entries: &[LessonEntry],
    selected: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style);

    // Keep the selection on screen
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if selected < *scroll_offset {
        *scroll_offset = selected;
    } else if selected >= *scroll_offset + visible_height {
        *scroll_offset = selected + 1 - visible_height;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(idx, entry)| {
            let (marker, marker_style) = if entry.passed {
                ("✓", Style::default().fg(DEFAULT_THEME.success))
            } else {
                ("✗", Style::default().fg(DEFAULT_THEME.error))
            };
            let indent = if entry.is_exercise { "  " } else { "" };
            let mut name_style = Style::default().fg(if entry.is_exercise {
                DEFAULT_THEME.comment
            } else {
                DEFAULT_THEME.fg
            });
            let mut row_style = Style::default();
            if idx == selected {
                name_style = name_style.add_modifier(Modifier::BOLD);
                row_style = row_style.bg(DEFAULT_THEME.selection_bg);
            }

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", marker), marker_style),
                Span::styled(format!("{}{}", indent, entry.name), name_style),
            ]))
            .style(row_style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
